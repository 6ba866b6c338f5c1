//! Hit-log export as CSV (`time,damage,type,hit_index,note`).

use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use crate::combat::report::{DamageReport, HitRecord};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("csv export buffer error: {0}")]
    Buffer(String),
}

/// Flat row: every column always present so rows line up with the header.
#[derive(Debug, Serialize)]
struct HitRow<'a> {
    time: f64,
    damage: u64,
    #[serde(rename = "type")]
    kind: &'static str,
    hit_index: Option<u32>,
    note: &'a str,
}

impl<'a> From<&'a HitRecord> for HitRow<'a> {
    fn from(hit: &'a HitRecord) -> Self {
        Self {
            time: hit.time,
            damage: hit.damage,
            kind: hit.kind.as_str(),
            hit_index: hit.hit_index,
            note: &hit.note,
        }
    }
}

pub fn write_hits_csv<W: Write>(report: &DamageReport, writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for hit in &report.hits {
        csv.serialize(HitRow::from(hit))?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn hits_to_csv_string(report: &DamageReport) -> Result<String, ExportError> {
    let mut csv = csv::Writer::from_writer(Vec::new());
    for hit in &report.hits {
        csv.serialize(HitRow::from(hit))?;
    }
    let bytes = csv
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
