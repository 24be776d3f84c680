#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::NaiveDate;
use equity_returns::QuoteSource;
use time::OffsetDateTime;
use yahoo_finance_api::{Quote, YahooError};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A daily quote stamped at the 14:30 UTC market open of `day`.
pub fn quote(day: NaiveDate, close: f64, adjclose: f64) -> Quote {
    let timestamp = day.and_hms_opt(14, 30, 0).unwrap().and_utc().timestamp();
    Quote {
        timestamp: timestamp as u64,
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        volume: 1_000,
        close,
        adjclose,
    }
}

/// Canned quote histories standing in for the remote provider.
#[derive(Default)]
pub struct FakeQuotes {
    histories: HashMap<String, Vec<Quote>>,
    pub requests: RefCell<Vec<String>>,
}

impl FakeQuotes {
    pub fn with(mut self, ticker: &str, closes: &[(NaiveDate, f64)]) -> Self {
        let quotes = closes
            .iter()
            .map(|(day, close)| quote(*day, *close, *close))
            .collect();
        self.histories.insert(ticker.to_string(), quotes);
        self
    }

    pub fn with_quotes(mut self, ticker: &str, quotes: Vec<Quote>) -> Self {
        self.histories.insert(ticker.to_string(), quotes);
        self
    }
}

impl QuoteSource for FakeQuotes {
    fn quote_history(
        &self,
        ticker: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Quote>, YahooError> {
        self.requests.borrow_mut().push(ticker.to_string());
        let quotes = self
            .histories
            .get(ticker)
            .ok_or_else(|| YahooError::FetchFailed(format!("unknown ticker {ticker}")))?;
        let (start, end) = (start.unix_timestamp(), end.unix_timestamp());
        Ok(quotes
            .iter()
            .filter(|quote| (start..end).contains(&(quote.timestamp as i64)))
            .cloned()
            .collect())
    }
}
