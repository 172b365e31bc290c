/// Aggregator: summary statistics over the stored population payload
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::storage::ObjectStore;
use crate::types::{AggregationResult, Config, DelimitedSummary, PopulationRow};

/// Inclusive year range for the population statistics
pub const START_YEAR: i64 = 2013;
pub const END_YEAR: i64 = 2018;

/// Decimal places kept in reported statistics
const ROUND_DIGITS: i32 = 2;

pub struct Aggregator {
    store: Arc<dyn ObjectStore>,
    config: Arc<Config>,
}

impl Aggregator {
    pub fn new(store: Arc<dyn ObjectStore>, config: Arc<Config>) -> Self {
        Aggregator { store, config }
    }

    /// Read both stored payloads and compute population mean / std over 2013-2018
    pub async fn run(&self) -> Result<AggregationResult> {
        let series_key = self.config.bls_data_key();
        let series = self.store.get_required(&series_key).await?;
        let summary = summarize_delimited(&series.content)?;
        info!(
            "Time series {}: {} rows, columns {:?}",
            series_key, summary.rows, summary.columns
        );

        let population_key = self.config.api_key();
        let population = self.store.get_required(&population_key).await?;
        let rows = parse_population(&population.content)?;
        debug!("Population {}: {} rows", population_key, rows.len());

        let result = population_stats(&rows, START_YEAR, END_YEAR)?;
        info!(
            "Mean population ({}-{}): {} | standard deviation: {:?}",
            result.start_year, result.end_year, result.mean_pop, result.std_pop
        );

        Ok(result)
    }
}

/// Column names and row count of a tab-delimited payload with a header row.
/// Header and field whitespace is trimmed; ragged rows are a parse error.
pub fn summarize_delimited(content: &[u8]) -> Result<DelimitedSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_reader(content);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(SyncError::Parse("delimited payload has no header row".to_string()));
    }

    let mut rows = 0;
    for record in reader.records() {
        record?;
        rows += 1;
    }

    Ok(DelimitedSummary { columns, rows })
}

/// Flatten the `data` array of the population payload into rows
pub fn parse_population(content: &[u8]) -> Result<Vec<PopulationRow>> {
    let value: Value = serde_json::from_slice(content)?;

    let data = value
        .get("data")
        .ok_or_else(|| SyncError::Parse("population payload has no 'data' field".to_string()))?
        .as_array()
        .ok_or_else(|| SyncError::Parse("'data' is not an array".to_string()))?;

    data.iter()
        .enumerate()
        .map(|(i, entry)| {
            let year = entry
                .get("Year")
                .and_then(coerce_year)
                .ok_or_else(|| SyncError::Parse(format!("row {}: missing or invalid 'Year'", i)))?;
            let population = entry
                .get("Population")
                .and_then(coerce_number)
                .ok_or_else(|| {
                    SyncError::Parse(format!("row {}: missing or invalid 'Population'", i))
                })?;
            Ok(PopulationRow { year, population })
        })
        .collect()
}

fn coerce_year(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Finite numbers only; "NaN" and "inf" strings are rejected
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// Mean and sample standard deviation of `population` for years in
/// `[start_year, end_year]`. No rows in range is `EmptyResult`; a single row
/// has no sample standard deviation.
pub fn population_stats(rows: &[PopulationRow], start_year: i64, end_year: i64) -> Result<AggregationResult> {
    let values: Vec<f64> = rows
        .iter()
        .filter(|r| r.year >= start_year && r.year <= end_year)
        .map(|r| r.population)
        .collect();

    if values.is_empty() {
        return Err(SyncError::EmptyResult { start_year, end_year });
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    let std = if values.len() < 2 {
        None
    } else {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(round_to(variance.sqrt(), ROUND_DIGITS))
    };

    Ok(AggregationResult {
        mean_pop: round_to(mean, ROUND_DIGITS),
        std_pop: std,
        rows: values.len(),
        start_year,
        end_year,
    })
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
