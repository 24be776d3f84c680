use polars::error::PolarsError;
use thiserror::Error;
use yahoo_finance_api::YahooError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("table must contain '{0}' column")]
    MissingColumn(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Provider(#[from] YahooError),
    #[error("malformed table file: {0}")]
    Parse(String),
    #[error("table layout cannot be used: {0}")]
    Layout(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error("reading loader configuration failed")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
