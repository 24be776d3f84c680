//! Tabular price data with a trading-date row index.
//!
//! A [`PriceTable`] pairs a polars [`DataFrame`] holding the data columns with
//! a separate index of trading dates, so the date never competes with the price
//! columns for a name. Long-format tables carry a [`TICKER`] column; tables for
//! a single security do not.

use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::{Error, Result};

pub const TICKER: &str = "Ticker";
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const ADJ_CLOSE: &str = "Adj Close";
pub const VOLUME: &str = "Volume";

/// Label given to the index of tables fetched from the quote provider.
pub const DATE_INDEX: &str = "Date";

/// Price fields a quote provider can report, in display order.
pub const PRICE_FIELDS: [&str; 6] = [OPEN, HIGH, LOW, CLOSE, ADJ_CLOSE, VOLUME];

/// Separator between the outer and inner label of a flattened two-level header.
pub const LEVEL_SEPARATOR: char = '/';

/// Joins a two-level column label into a single column name.
pub fn flatten_label(outer: &str, inner: &str) -> String {
    match (outer.trim(), inner.trim()) {
        ("", inner) => inner.to_string(),
        (outer, "") => outer.to_string(),
        (outer, inner) => format!("{outer}{LEVEL_SEPARATOR}{inner}"),
    }
}

#[derive(Debug, Clone)]
pub struct PriceTable {
    index: Vec<NaiveDate>,
    index_name: Option<String>,
    frame: DataFrame,
}

impl PriceTable {
    pub fn new(index: Vec<NaiveDate>, frame: DataFrame) -> Result<Self> {
        if frame.width() > 0 && frame.height() != index.len() {
            return Err(Error::Layout(format!(
                "index has {} dates but the columns have {} rows",
                index.len(),
                frame.height()
            )));
        }
        Ok(Self {
            index,
            index_name: None,
            frame,
        })
    }

    pub fn empty() -> Self {
        Self {
            index: Vec::new(),
            index_name: None,
            frame: DataFrame::empty(),
        }
    }

    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    pub fn set_index_name(&mut self, name: Option<String>) {
        self.index_name = name;
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// True when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.frame.width() == 0
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// Rows by data columns, the index not counted as a column.
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Values of a numeric column as `f64`, missing entries as `None`.
    pub fn column_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| Error::MissingColumn(name.to_string()))?;
        let values = column.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().collect())
    }

    /// Replaces the data columns after a transform that kept every row in place.
    pub(crate) fn replace_frame(&mut self, frame: DataFrame) -> Result<()> {
        if frame.height() != self.index.len() {
            return Err(Error::Layout(format!(
                "transform produced {} rows for an index of {}",
                frame.height(),
                self.index.len()
            )));
        }
        self.frame = frame;
        Ok(())
    }

    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.index.len());
        Self {
            index: self.index[..n].to_vec(),
            index_name: self.index_name.clone(),
            frame: self.frame.head(Some(n)),
        }
    }

    pub fn tail(&self, n: usize) -> Self {
        let n = n.min(self.index.len());
        Self {
            index: self.index[self.index.len() - n..].to_vec(),
            index_name: self.index_name.clone(),
            frame: self.frame.tail(Some(n)),
        }
    }

    /// The table as a single frame with the index as its leading date column.
    ///
    /// An unlabelled index gets an empty column name.
    pub fn to_frame(&self) -> Result<DataFrame> {
        // NaiveDate::default() is the unix epoch
        let epoch = NaiveDate::default();
        let days: Vec<i32> = self
            .index
            .iter()
            .map(|date| date.signed_duration_since(epoch).num_days() as i32)
            .collect();
        let dates = Series::new(self.index_name().unwrap_or("").into(), days)
            .cast(&DataType::Date)?;
        let mut frame = self.frame.clone();
        if frame.width() == 0 {
            return Ok(DataFrame::new(vec![dates.into_column()])?);
        }
        frame.insert_column(0, dates.into_column())?;
        Ok(frame)
    }
}
