//! Price table acquisition: remote quotes, saved CSV files, and the
//! wide-to-long reshape that turns per-security column blocks into one row
//! per (date, ticker) pair.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate};
use polars::prelude::*;
use time::macros::time;
use time::{Date, Month, OffsetDateTime};
use tracing::{debug, info, warn};
use yahoo_finance_api::Quote;

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::price_table::{
    flatten_label, PriceTable, ADJ_CLOSE, CLOSE, DATE_INDEX, HIGH, LEVEL_SEPARATOR, LOW, OPEN,
    PRICE_FIELDS, TICKER, VOLUME,
};
use crate::yahoo_finance::{QuoteSource, YahooQuotes};

/// One trading day of a single security after price adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bar {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    adj_close: f64,
    volume: u64,
}

impl Bar {
    fn from_quote(quote: &Quote, auto_adjust: bool) -> Self {
        // the provider reports a missing adjusted close as zero
        let adj_close = if quote.adjclose > 0.0 {
            quote.adjclose
        } else {
            quote.close
        };
        if !auto_adjust || quote.close == 0.0 {
            return Self {
                open: quote.open,
                high: quote.high,
                low: quote.low,
                close: quote.close,
                adj_close,
                volume: quote.volume,
            };
        }
        let ratio = adj_close / quote.close;
        Self {
            open: quote.open * ratio,
            high: quote.high * ratio,
            low: quote.low * ratio,
            close: adj_close,
            adj_close,
            volume: quote.volume,
        }
    }

    fn field(&self, name: &str) -> Option<f64> {
        match name {
            OPEN => Some(self.open),
            HIGH => Some(self.high),
            LOW => Some(self.low),
            CLOSE => Some(self.close),
            ADJ_CLOSE => Some(self.adj_close),
            _ => None,
        }
    }
}

pub struct DataLoader<S> {
    source: S,
    config: LoaderConfig,
}

impl DataLoader<YahooQuotes> {
    pub fn yahoo(config: LoaderConfig) -> Result<Self> {
        Ok(Self::new(YahooQuotes::new()?, config))
    }
}

impl<S: QuoteSource> DataLoader<S> {
    pub fn new(source: S, config: LoaderConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Price fields reported for each trading day under the current configuration.
    fn fields(&self) -> Vec<&'static str> {
        PRICE_FIELDS
            .into_iter()
            .filter(|field| !(self.config.auto_adjust && *field == ADJ_CLOSE))
            .collect()
    }

    fn report(&self, message: &str, ticker: &str, start: NaiveDate, end: NaiveDate, rows: usize) {
        if self.config.debug {
            info!(ticker, %start, %end, rows, "{message}");
        } else {
            debug!(ticker, %start, %end, rows, "{message}");
        }
    }

    /// Fetches `ticker` over `[start, end)` as bars keyed by trading date.
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, Bar>> {
        let mut bars = BTreeMap::new();
        if start >= end {
            self.report("empty date range, skipping request", ticker, start, end, 0);
            return Ok(bars);
        }
        self.report("requesting quote history", ticker, start, end, 0);
        let quotes = self
            .source
            .quote_history(ticker, day_start(start)?, day_start(end)?)?;
        for quote in &quotes {
            let date = quote_date(quote)?;
            if date < start || date >= end {
                continue;
            }
            // a repeated trading day keeps the latest quote
            bars.insert(date, Bar::from_quote(quote, self.config.auto_adjust));
        }
        if bars.is_empty() {
            warn!(ticker, %start, %end, "no quotes in requested range");
        }
        self.report("received quote history", ticker, start, end, bars.len());
        Ok(bars)
    }

    /// Daily price history of one security, indexed by `Date`, without a `Ticker` column.
    pub fn load_single(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceTable> {
        let bars = self.fetch_bars(ticker, start, end)?;
        if bars.is_empty() {
            return Ok(PriceTable::empty());
        }
        let mut columns = Vec::new();
        for field in self.fields() {
            let column = if field == VOLUME {
                let volumes: Vec<u64> = bars.values().map(|bar| bar.volume).collect();
                Column::new(field.into(), volumes)
            } else {
                let values: Vec<f64> = bars.values().filter_map(|bar| bar.field(field)).collect();
                Column::new(field.into(), values)
            };
            columns.push(column);
        }
        let index = bars.keys().copied().collect();
        Ok(PriceTable::new(index, DataFrame::new(columns)?)?.with_index_name(DATE_INDEX))
    }

    /// Several securities stacked into one row per (date, ticker) pair.
    ///
    /// The quotes are first laid out wide, one `"{ticker}/{field}"` block per
    /// security over the union of trading dates, then stacked with
    /// [`to_long_format`]. Ties on a date follow the order of `tickers`.
    pub fn load_long_format(
        &self,
        tickers: &BTreeSet<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceTable> {
        let mut blocks = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            blocks.push((ticker, self.fetch_bars(ticker, start, end)?));
        }
        let dates: BTreeSet<NaiveDate> = blocks
            .iter()
            .flat_map(|(_, bars)| bars.keys().copied())
            .collect();
        if dates.is_empty() {
            return Ok(PriceTable::empty());
        }

        let fields = self.fields();
        let mut columns = Vec::with_capacity(blocks.len() * fields.len());
        for (ticker, bars) in &blocks {
            for field in &fields {
                let label = flatten_label(ticker, field);
                let column = if *field == VOLUME {
                    let volumes: Vec<Option<u64>> = dates
                        .iter()
                        .map(|date| bars.get(date).map(|bar| bar.volume))
                        .collect();
                    Column::new(label.into(), volumes)
                } else {
                    let values: Vec<Option<f64>> = dates
                        .iter()
                        .map(|date| bars.get(date).and_then(|bar| bar.field(field)))
                        .collect();
                    Column::new(label.into(), values)
                };
                columns.push(column);
            }
        }
        let wide = PriceTable::new(dates.into_iter().collect(), DataFrame::new(columns)?)?
            .with_index_name(DATE_INDEX);
        to_long_format(&wide)
    }
}

const ROW: &str = "__row";
const BLOCK: &str = "__block";

/// Stacks a wide table with `"{outer}/{inner}"` column labels into long form.
///
/// Whichever label level holds only price field names becomes the columns of
/// the result, the other level becomes the `Ticker` column. Securities keep the
/// order of their first column block, and a (date, ticker) pair whose fields are
/// all missing is dropped. Every field keeps the dtype of its source columns,
/// with floating point `NaN` read as missing.
pub fn to_long_format(table: &PriceTable) -> Result<PriceTable> {
    let names = table.column_names();
    let is_field = |label: &str| PRICE_FIELDS.contains(&label);
    // tickers may contain the separator themselves, so split next to the field level
    let leading: Option<Vec<(&str, &str)>> = names
        .iter()
        .map(|name| name.split_once(LEVEL_SEPARATOR))
        .map(|label| label.filter(|(outer, _)| is_field(*outer)))
        .map(|label| label.map(|(field, ticker)| (ticker, field)))
        .collect();
    let trailing: Option<Vec<(&str, &str)>> = names
        .iter()
        .map(|name| name.rsplit_once(LEVEL_SEPARATOR))
        .map(|label| label.filter(|(_, inner)| is_field(*inner)))
        .collect();
    let labels = leading.or(trailing).ok_or_else(|| {
        Error::Layout("columns are not labelled by ticker and price field".to_string())
    })?;

    // security -> (field, source column, source dtype), in first-appearance order
    let mut blocks: Vec<(&str, Vec<(&str, &str, DataType)>)> = Vec::new();
    let mut fields: Vec<(&str, DataType)> = Vec::new();
    for (name, (ticker, field)) in names.iter().zip(labels) {
        let dtype = table.frame().column(name)?.dtype().clone();
        if !fields.iter().any(|(known, _)| *known == field) {
            fields.push((field, dtype.clone()));
        }
        let source = (field, name.as_str(), dtype);
        match blocks.iter_mut().find(|(known, _)| *known == ticker) {
            Some((_, columns)) => columns.push(source),
            None => blocks.push((ticker, vec![source])),
        }
    }
    let present = fields
        .iter()
        .map(|(field, _)| col(*field).is_not_null())
        .reduce(|any, next| any.or(next))
        .ok_or_else(|| Error::Layout("table has no price columns to stack".to_string()))?;

    let wide = table.frame().clone().lazy().with_row_index(ROW, None);
    let stacked: Vec<LazyFrame> = blocks
        .iter()
        .enumerate()
        .map(|(position, (ticker, columns))| {
            let mut selection = vec![
                col(ROW),
                lit(position as u32).alias(BLOCK),
                lit(*ticker).alias(TICKER),
            ];
            for (field, dtype) in &fields {
                let value = match columns.iter().find(|(known, _, _)| known == field) {
                    Some((_, source, dtype)) if dtype.is_float() => {
                        col(*source).fill_nan(lit(NULL).cast(dtype.clone()))
                    }
                    Some((_, source, _)) => col(*source),
                    None => lit(NULL).cast(dtype.clone()),
                };
                selection.push(value.alias(*field));
            }
            wide.clone().select(selection).filter(present.clone())
        })
        .collect();

    let mut order = vec![col(ROW), col(TICKER)];
    order.extend(fields.iter().map(|(field, _)| col(*field)));
    let args = UnionArgs {
        to_supertypes: true,
        ..Default::default()
    };
    let long = concat(stacked, args)?
        .sort([ROW, BLOCK], SortMultipleOptions::default())
        .select(order)
        .collect()?;

    let rows = long.column(ROW)?.cast(&DataType::UInt64)?;
    let index = rows
        .u64()?
        .into_no_null_iter()
        .map(|row| table.index()[row as usize])
        .collect();
    let mut long = PriceTable::new(index, long.drop(ROW)?)?;
    long.set_index_name(table.index_name().map(str::to_string));
    Ok(long)
}

/// Reads a CSV file saved with a two-row column header.
///
/// The first column holds the dates, the row right after the header only
/// repeats index metadata and is skipped. The returned index carries no label.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<PriceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;
    let mut records = reader.records();

    let outer = records
        .next()
        .ok_or_else(|| Error::Parse("missing outer header row".to_string()))??;
    let inner = records
        .next()
        .ok_or_else(|| Error::Parse("missing inner header row".to_string()))??;
    if outer.len() < 2 {
        return Err(Error::Parse(
            "expected an index column followed by data columns".to_string(),
        ));
    }
    records
        .next()
        .ok_or_else(|| Error::Parse("missing index metadata row".to_string()))??;

    let names: Vec<String> = outer
        .iter()
        .zip(inner.iter())
        .skip(1)
        .map(|(outer, inner)| flatten_label(header_label(outer), header_label(inner)))
        .collect();
    let mut index = Vec::new();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];
    for record in records {
        let record = record?;
        index.push(parse_index_date(&record[0])?);
        for (column, cell) in values.iter_mut().zip(record.iter().skip(1)) {
            column.push(parse_cell(cell)?);
        }
    }
    debug!(path = %path.as_ref().display(), rows = index.len(), columns = names.len(), "read table");

    let columns = names
        .iter()
        .zip(values)
        .map(|(name, column)| Column::new(name.as_str().into(), column))
        .collect();
    PriceTable::new(index, DataFrame::new(columns)?)
}

/// Blank header cells come back as `Unnamed: ..` once a file has been through pandas.
fn header_label(label: &str) -> &str {
    if label.trim_start().starts_with("Unnamed:") {
        ""
    } else {
        label
    }
}

fn parse_index_date(cell: &str) -> Result<NaiveDate> {
    let cell = cell.trim();
    let day = cell.split([' ', 'T']).next().unwrap_or(cell);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| Error::Parse(format!("index value '{cell}' is not a date: {e}")))
}

fn parse_cell(cell: &str) -> Result<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(|value| (!value.is_nan()).then_some(value))
        .map_err(|e| Error::Parse(format!("value '{cell}' is not numeric: {e}")))
}

fn day_start(date: NaiveDate) -> Result<OffsetDateTime> {
    let month = Month::try_from(date.month() as u8)
        .map_err(|e| Error::InvalidArgument(e.to_string()))?;
    let day = Date::from_calendar_date(date.year(), month, date.day() as u8)
        .map_err(|e| Error::InvalidArgument(e.to_string()))?;
    Ok(OffsetDateTime::new_utc(day, time!(0:00:00)))
}

fn quote_date(quote: &Quote) -> Result<NaiveDate> {
    DateTime::from_timestamp(quote.timestamp as i64, 0)
        .map(|stamp| stamp.date_naive())
        .ok_or_else(|| Error::Parse(format!("quote timestamp {} is out of range", quote.timestamp)))
}
