use time::OffsetDateTime;
use tokio::runtime::{Builder, Handle, Runtime};
use yahoo_finance_api as yahoo;
use yahoo_finance_api::{Quote, YahooError};

use crate::error::{Error, Result};

/// Daily quote history for one ticker over `[start, end)`.
pub trait QuoteSource {
    fn quote_history(
        &self,
        ticker: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> std::result::Result<Vec<Quote>, YahooError>;
}

/// Yahoo! Finance over a private current-thread runtime, so every call blocks.
///
/// Blocking calls cannot be made from async code: creating or using a
/// `YahooQuotes` on a thread that already runs a tokio runtime fails with an
/// error instead of a request.
pub struct YahooQuotes {
    provider: yahoo::YahooConnector,
    runtime: Runtime,
}

impl YahooQuotes {
    pub fn new() -> Result<Self> {
        if inside_runtime() {
            return Err(Error::InvalidArgument(
                "blocking quote source created inside an async runtime".to_string(),
            ));
        }
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            provider: yahoo::YahooConnector::new(),
            runtime,
        })
    }

    async fn yahoo_it(
        &self,
        ticker: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> std::result::Result<Vec<Quote>, YahooError> {
        // returns historic quotes with daily interval
        self.provider
            .get_quote_history(ticker, start, end)
            .await?
            .quotes()
    }
}

impl QuoteSource for YahooQuotes {
    fn quote_history(
        &self,
        ticker: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> std::result::Result<Vec<Quote>, YahooError> {
        if inside_runtime() {
            return Err(YahooError::FetchFailed(
                "blocking request made inside an async runtime".to_string(),
            ));
        }
        match self.runtime.block_on(self.yahoo_it(ticker, start, end)) {
            // yahoo answers a range without trading days with an empty data set
            Err(YahooError::EmptyDataSet) => Ok(Vec::new()),
            other => other,
        }
    }
}

fn inside_runtime() -> bool {
    Handle::try_current().is_ok()
}

impl<S: QuoteSource + ?Sized> QuoteSource for &S {
    fn quote_history(
        &self,
        ticker: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> std::result::Result<Vec<Quote>, YahooError> {
        (**self).quote_history(ticker, start, end)
    }
}
