//! CSV input and output for experiment records
//!
//! The expected layout matches the public mobile-game gate experiment
//! dataset:
//!
//! ```text
//! userid,version,sum_gamerounds,retention_1,retention_7
//! 116,gate_30,3,False,False
//! 337,gate_30,38,True,False
//! ```
//!
//! Column order is free and `user_id`, `variant`, `rounds_played`,
//! `retention_1day`, `retention_7day` are accepted as alternative headers.
//! Retention flags may be written as `True`/`False` or `1`/`0` in any case.
//! Any malformed row aborts loading.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, DatasetError, UserRecord, VariantLabels};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum LoadError {
    #[display("malformed CSV input: {_0}")]
    Csv(csv::Error),
    #[display("line {line}: unknown variant label '{label}'")]
    #[from(ignore)]
    UnknownVariant { line: u64, label: String },
    #[display("line {line}: invalid boolean '{value}' in column {column}")]
    #[from(ignore)]
    InvalidFlag {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[display("invalid dataset: {_0}")]
    Dataset(DatasetError),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "user_id")]
    userid: u64,
    #[serde(alias = "variant")]
    version: String,
    #[serde(alias = "rounds_played")]
    sum_gamerounds: u64,
    #[serde(alias = "retention_1day")]
    retention_1: String,
    #[serde(alias = "retention_7day")]
    retention_7: String,
}

#[derive(Debug, Serialize)]
struct CsvRowOut<'a> {
    userid: u64,
    version: &'a str,
    sum_gamerounds: u64,
    retention_1: &'static str,
    retention_7: &'static str,
}

fn parse_flag(line: u64, column: &'static str, value: &str) -> Result<bool, LoadError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(LoadError::InvalidFlag {
            line,
            column,
            value: value.to_owned(),
        }),
    }
}

fn format_flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Reads and validates a dataset from CSV.
pub fn read_csv<R>(reader: R, labels: &VariantLabels) -> Result<Dataset, LoadError>
where
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = vec![];
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        // Header occupies line 1
        let line = index as u64 + 2;
        let variant = labels
            .variant_of(&row.version)
            .ok_or_else(|| LoadError::UnknownVariant {
                line,
                label: row.version.clone(),
            })?;
        records.push(UserRecord {
            user_id: row.userid,
            variant,
            retention_1day: parse_flag(line, "retention_1", &row.retention_1)?,
            retention_7day: parse_flag(line, "retention_7", &row.retention_7)?,
            rounds_played: row.sum_gamerounds,
        });
    }

    let dataset = Dataset::new(records)?;
    tracing::info!(
        records = dataset.len(),
        control = dataset.counts().control,
        treatment = dataset.counts().treatment,
        "dataset loaded"
    );
    Ok(dataset)
}

/// Writes a dataset as CSV in the layout [`read_csv`] accepts.
pub fn write_csv<W>(writer: W, dataset: &Dataset, labels: &VariantLabels) -> Result<(), csv::Error>
where
    W: Write,
{
    let mut writer = csv::Writer::from_writer(writer);
    for record in dataset.records() {
        writer.serialize(CsvRowOut {
            userid: record.user_id,
            version: labels.label(record.variant),
            sum_gamerounds: record.rounds_played,
            retention_1: format_flag(record.retention_1day),
            retention_7: format_flag(record.retention_7day),
        })?;
    }
    writer.flush()?;
    Ok(())
}
