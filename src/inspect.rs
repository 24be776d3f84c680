//! Read-only text reports about a [`PriceTable`].

use std::io::{self, Write};

use polars::prelude::*;

use crate::error::Result;
use crate::price_table::PriceTable;

const STATISTICS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Schema, index range, first and last rows, columns and shape.
pub fn describe(table: &PriceTable) -> Result<()> {
    describe_to(table, &mut io::stdout().lock())
}

pub fn describe_to<W: Write>(table: &PriceTable, out: &mut W) -> Result<()> {
    if table.is_empty() {
        writeln!(out, "Table is empty.")?;
        return Ok(());
    }
    writeln!(out, "Table info:")?;
    let index = table.index();
    writeln!(
        out,
        "Index: {} entries, {} to {}",
        index.len(),
        index[0],
        index[index.len() - 1]
    )?;
    writeln!(out, "{:<4} {:<28} {:>14}  {}", "#", "Column", "Non-Null Count", "Dtype")?;
    for (position, column) in table.frame().get_columns().iter().enumerate() {
        writeln!(
            out,
            "{:<4} {:<28} {:>14}  {}",
            position,
            column.name().as_str(),
            column.len() - column.null_count(),
            column.dtype()
        )?;
    }
    writeln!(out, "\nFirst 5 rows:\n{}", table.head(5).to_frame()?)?;
    writeln!(out, "\nLast 5 rows:\n{}", table.tail(5).to_frame()?)?;
    writeln!(out, "\nColumns: {:?}", table.column_names())?;
    let (rows, columns) = table.shape();
    writeln!(out, "\nShape: ({rows}, {columns})")?;
    Ok(())
}

/// Descriptive statistics, missing values, dtypes and distinct values per column.
pub fn summarize(table: &PriceTable) -> Result<()> {
    summarize_to(table, &mut io::stdout().lock())
}

pub fn summarize_to<W: Write>(table: &PriceTable, out: &mut W) -> Result<()> {
    // NaN counts as missing in every section below
    let frame = without_nan(table.frame())?;
    writeln!(out, "Table statistics:")?;
    match statistics(&frame)? {
        Some(stats) => writeln!(out, "{stats}")?,
        None => writeln!(out, "No numeric columns.")?,
    }

    writeln!(out, "\nMissing values:")?;
    for column in frame.get_columns() {
        writeln!(out, "{:<28} {}", column.name().as_str(), column.null_count())?;
    }
    writeln!(out, "\nData types:")?;
    for column in frame.get_columns() {
        writeln!(out, "{:<28} {}", column.name().as_str(), column.dtype())?;
    }
    writeln!(out, "\nUnique values in each column:")?;
    for column in frame.get_columns() {
        writeln!(out, "{}: {}", column.name(), distinct_values(column)?)?;
    }
    Ok(())
}

/// First and last `n` rows.
pub fn preview(table: &PriceTable, n: usize) -> Result<()> {
    preview_to(table, n, &mut io::stdout().lock())
}

pub fn preview_to<W: Write>(table: &PriceTable, n: usize, out: &mut W) -> Result<()> {
    writeln!(out, "First {n} rows:\n{}", table.head(n).to_frame()?)?;
    writeln!(out, "\nLast {n} rows:\n{}", table.tail(n).to_frame()?)?;
    Ok(())
}

/// Replaces `NaN` with a missing value in every floating point column.
fn without_nan(frame: &DataFrame) -> Result<DataFrame> {
    let normalised: Vec<Expr> = frame
        .get_columns()
        .iter()
        .filter(|column| column.dtype().is_float())
        .map(|column| {
            let name = column.name().as_str();
            col(name).fill_nan(lit(NULL).cast(column.dtype().clone()))
        })
        .collect();
    if normalised.is_empty() {
        return Ok(frame.clone());
    }
    Ok(frame.clone().lazy().with_columns(normalised).collect()?)
}

/// Distinct non-missing values.
fn distinct_values(column: &Column) -> Result<usize> {
    let distinct = column.as_materialized_series().n_unique()?;
    Ok(if column.null_count() > 0 {
        distinct - 1
    } else {
        distinct
    })
}

/// One row per entry of [`STATISTICS`], one column per numeric column of `frame`.
///
/// Missing values are skipped, the standard deviation is the sample one.
fn statistics(frame: &DataFrame) -> Result<Option<DataFrame>> {
    let mut columns = vec![Column::new("statistic".into(), STATISTICS)];
    for column in frame.get_columns() {
        if !column.dtype().is_primitive_numeric() {
            continue;
        }
        let name = column.name().as_str();
        let value = || col(name).cast(DataType::Float64);
        let quartile = |q: f64| value().quantile(lit(q), QuantileMethod::Linear);
        let row = frame
            .clone()
            .lazy()
            .select([
                value().count().cast(DataType::Float64).alias(STATISTICS[0]),
                value().mean().alias(STATISTICS[1]),
                value().std(1).alias(STATISTICS[2]),
                value().min().alias(STATISTICS[3]),
                quartile(0.25).alias(STATISTICS[4]),
                quartile(0.50).alias(STATISTICS[5]),
                quartile(0.75).alias(STATISTICS[6]),
                value().max().alias(STATISTICS[7]),
            ])
            .collect()?;
        let summary = STATISTICS
            .iter()
            .map(|statistic| Ok(row.column(statistic)?.f64()?.get(0)))
            .collect::<PolarsResult<Vec<Option<f64>>>>()?;
        columns.push(Column::new(name.into(), summary));
    }
    if columns.len() == 1 {
        return Ok(None);
    }
    Ok(Some(DataFrame::new(columns)?))
}
