//! Historical equity prices and the returns derived from them.
//!
//! # Loading prices
//! [`DataLoader`] fetches daily quotes from Yahoo! Finance for one ticker or
//! for a set of tickers stacked into long format, and [`read_table`] reads a
//! CSV file saved with a two-row column header.
//!
//! # Usage:
//! ```no_run
//! use std::collections::BTreeSet;
//! use chrono::NaiveDate;
//! use equity_returns::{compute_returns, DataLoader, LoaderConfig};
//!
//! let loader = DataLoader::yahoo(LoaderConfig::default())?;
//! let tickers: BTreeSet<String> = ["AAPL", "MSFT"].map(String::from).into();
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
//! let mut table = loader.load_long_format(&tickers, start, end)?;
//! compute_returns(&mut table, "log")?;
//! equity_returns::inspect::preview(&table, 5)?;
//! # Ok::<(), equity_returns::Error>(())
//! ```
//!
//! # Returns
//! [`compute_returns`] adds either `Daily Return` and `Cumulative Simple Return`
//! or `Log Return` and `Cumulative Log Return`, computed separately for every
//! `Ticker`.

pub mod config;
pub mod data_loader;
pub mod error;
pub mod inspect;
pub mod price_table;
pub mod stock_returns;
pub mod yahoo_finance;

pub use config::LoaderConfig;
pub use data_loader::{read_table, to_long_format, DataLoader};
pub use error::{Error, Result};
pub use price_table::PriceTable;
pub use stock_returns::{
    compute_returns, compute_returns_with, cumulative_log_returns, cumulative_simple_returns,
    daily_log_returns, daily_simple_returns, ReturnMethod,
};
pub use yahoo_finance::{QuoteSource, YahooQuotes};
