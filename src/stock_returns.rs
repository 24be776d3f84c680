//! Per-security return columns for long-format price tables.
//!
//! Every transform works within each `Ticker` group, so one security's
//! history never leaks into another's. The first row of each group has no
//! predecessor and its daily return is missing. Running aggregates skip missing
//! values: the leading gap stays missing in the cumulative column and later
//! values accumulate as if it were absent.

use std::fmt;
use std::str::FromStr;

use polars::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::price_table::{PriceTable, CLOSE, TICKER};

pub const DAILY_RETURN: &str = "Daily Return";
pub const LOG_RETURN: &str = "Log Return";
pub const CUMULATIVE_SIMPLE_RETURN: &str = "Cumulative Simple Return";
pub const CUMULATIVE_LOG_RETURN: &str = "Cumulative Log Return";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnMethod {
    Log,
    Simple,
}

impl FromStr for ReturnMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "log" => Ok(ReturnMethod::Log),
            "simple" => Ok(ReturnMethod::Simple),
            _ => Err(Error::InvalidArgument(format!(
                "method must be 'log' or 'simple', got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for ReturnMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnMethod::Log => write!(f, "log"),
            ReturnMethod::Simple => write!(f, "simple"),
        }
    }
}

fn require(table: &PriceTable, column: &str) -> Result<()> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(Error::MissingColumn(column.to_string()))
    }
}

/// Evaluates `expr` within each ticker group and stores it as `target`.
///
/// The table is only touched once the whole column has been computed.
fn add_grouped_column<'a>(
    table: &'a mut PriceTable,
    source: &str,
    target: &str,
    expr: Expr,
) -> Result<&'a mut PriceTable> {
    require(table, source)?;
    require(table, TICKER)?;
    let frame = table
        .frame()
        .clone()
        .lazy()
        .with_column(expr.over([col(TICKER)]).alias(target))
        .collect()?;
    table.replace_frame(frame)?;
    Ok(table)
}

fn close_and_previous() -> (Expr, Expr) {
    let close = col(CLOSE).cast(DataType::Float64);
    let previous = close.clone().shift(lit(1));
    (close, previous)
}

/// Adds `Daily Return`, the fractional change of `Close` from the previous row.
pub fn daily_simple_returns(table: &mut PriceTable) -> Result<&mut PriceTable> {
    let (close, previous) = close_and_previous();
    let change = (close - previous.clone()) / previous;
    add_grouped_column(table, CLOSE, DAILY_RETURN, change)
}

/// Adds `Log Return`, the natural log of `Close` over the previous `Close`.
pub fn daily_log_returns(table: &mut PriceTable) -> Result<&mut PriceTable> {
    let (close, previous) = close_and_previous();
    let ratio = (close / previous).log(std::f64::consts::E);
    add_grouped_column(table, CLOSE, LOG_RETURN, ratio)
}

/// Adds `Cumulative Log Return`, the running sum of `Log Return`.
pub fn cumulative_log_returns(table: &mut PriceTable) -> Result<&mut PriceTable> {
    let running = col(LOG_RETURN).cum_sum(false);
    add_grouped_column(table, LOG_RETURN, CUMULATIVE_LOG_RETURN, running)
}

/// Adds `Cumulative Simple Return`, the compounded `Daily Return` minus one.
pub fn cumulative_simple_returns(table: &mut PriceTable) -> Result<&mut PriceTable> {
    let growth = (lit(1.0) + col(DAILY_RETURN)).cum_prod(false) - lit(1.0);
    add_grouped_column(table, DAILY_RETURN, CUMULATIVE_SIMPLE_RETURN, growth)
}

/// Adds the daily and cumulative columns of the return family named by `method`.
///
/// `method` is either `"log"` or `"simple"`. Anything else fails before the
/// table is touched.
pub fn compute_returns<'a>(table: &'a mut PriceTable, method: &str) -> Result<&'a mut PriceTable> {
    let method: ReturnMethod = method.parse()?;
    compute_returns_with(table, method)
}

pub fn compute_returns_with(
    table: &mut PriceTable,
    method: ReturnMethod,
) -> Result<&mut PriceTable> {
    debug!(%method, rows = table.height(), "computing returns");
    match method {
        ReturnMethod::Log => {
            daily_log_returns(table)?;
            cumulative_log_returns(table)
        }
        ReturnMethod::Simple => {
            daily_simple_returns(table)?;
            cumulative_simple_returns(table)
        }
    }
}
