use crate::{
    core::{
        cell::{Cell, ShardCell, ThinCell},
        row::Row,
    },
    job::{MappingMode, WriteMode},
};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use std::io::{Read, Write};
use thiserror::Error;

/// Column name the merged payload is stored under when none is configured.
pub const DEFAULT_MERGE_QUALIFIER: &str = "merge";

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to encode merge payload: {0}")]
    Encode(#[from] std::io::Error),

    #[error("failed to serialize merge payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Transform from one input row to the cells written into its shard file.
///
/// The variant set is fixed: one mapper per (write mode, mapping mode)
/// combination. Mappers are pure and safe to run concurrently across rows.
#[derive(Debug, Clone)]
pub enum CellMapper {
    OneToOne { family: String },
    OneToOneThin { family: String },
    ArrayMerge { family: String, qualifier: String },
    ArrayMergeThin { qualifier: String },
}

impl CellMapper {
    /// Resolves the mapper for the job's write-mode/mapping-mode pair.
    pub fn for_modes(
        write_mode: WriteMode,
        mapping_mode: MappingMode,
        family: &str,
        merge_qualifier: &str,
    ) -> Self {
        match (write_mode, mapping_mode) {
            (WriteMode::BulkLoad, MappingMode::OneToOne) => CellMapper::OneToOne {
                family: family.to_string(),
            },
            (WriteMode::ThinBulkLoad, MappingMode::OneToOne) => CellMapper::OneToOneThin {
                family: family.to_string(),
            },
            (WriteMode::BulkLoad, MappingMode::ArrayMerge) => CellMapper::ArrayMerge {
                family: family.to_string(),
                qualifier: merge_qualifier.to_string(),
            },
            (WriteMode::ThinBulkLoad, MappingMode::ArrayMerge) => CellMapper::ArrayMergeThin {
                qualifier: merge_qualifier.to_string(),
            },
        }
    }

    /// Maps one row to its output cells. `timestamp` is stamped onto full
    /// cells; thin cells defer it to load time.
    pub fn map_row(&self, row: &Row, timestamp: i64) -> Result<Vec<ShardCell>, MappingError> {
        match self {
            CellMapper::OneToOne { family } => Ok(row
                .fields
                .iter()
                .map(|field| {
                    ShardCell::Full(Cell {
                        row_key: row.key.clone(),
                        family: family.clone(),
                        qualifier: field.name.clone(),
                        timestamp,
                        value: field.value.as_ref().map(|v| v.encode()).unwrap_or_default(),
                    })
                })
                .collect()),

            CellMapper::OneToOneThin { family: _ } => Ok(row
                .fields
                .iter()
                .map(|field| {
                    ShardCell::Thin(ThinCell {
                        row_key: row.key.clone(),
                        qualifier: field.name.clone(),
                        value: field.value.as_ref().map(|v| v.encode()).unwrap_or_default(),
                    })
                })
                .collect()),

            CellMapper::ArrayMerge { family, qualifier } => {
                let payload = encode_merge_payload(row)?;
                Ok(vec![ShardCell::Full(Cell {
                    row_key: row.key.clone(),
                    family: family.clone(),
                    qualifier: qualifier.clone(),
                    timestamp,
                    value: payload,
                })])
            }

            CellMapper::ArrayMergeThin { qualifier } => {
                let payload = encode_merge_payload(row)?;
                Ok(vec![ShardCell::Thin(ThinCell {
                    row_key: row.key.clone(),
                    qualifier: qualifier.clone(),
                    value: payload,
                })])
            }
        }
    }
}

/// Serializes all non-key fields of `row` into one compressed payload:
/// a JSON object keyed by column name, gzip-compressed.
pub fn encode_merge_payload(row: &Row) -> Result<Vec<u8>, MappingError> {
    let mut object = serde_json::Map::with_capacity(row.fields.len());
    for field in &row.fields {
        let value = field
            .value
            .as_ref()
            .map(|v| v.to_json())
            .unwrap_or(serde_json::Value::Null);
        object.insert(field.name.clone(), value);
    }
    let json = serde_json::to_vec(&serde_json::Value::Object(object))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Inverse of [`encode_merge_payload`]; used by load-side consumers and
/// tests to recover the original column map.
pub fn decode_merge_payload(payload: &[u8]) -> Result<serde_json::Value, MappingError> {
    let mut decoder = GzDecoder::new(payload);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}
