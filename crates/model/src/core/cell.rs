use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A fully materialized cell destined for one partition of the target table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cell {
    pub row_key: Vec<u8>,
    pub family: String,
    pub qualifier: String,
    pub timestamp: i64,
    pub value: Vec<u8>,
}

/// Lighter cell form emitted in thin write mode: family and timestamp are
/// resolved by the store at load time, not carried per cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThinCell {
    pub row_key: Vec<u8>,
    pub qualifier: String,
    pub value: Vec<u8>,
}

/// Cell representation written into a shard file. Shard files contain either
/// all-full or all-thin cells depending on the job's write mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShardCell {
    Full(Cell),
    Thin(ThinCell),
}

impl ShardCell {
    pub fn row_key(&self) -> &[u8] {
        match self {
            ShardCell::Full(c) => &c.row_key,
            ShardCell::Thin(c) => &c.row_key,
        }
    }

    pub fn qualifier(&self) -> &str {
        match self {
            ShardCell::Full(c) => &c.qualifier,
            ShardCell::Thin(c) => &c.qualifier,
        }
    }

    pub fn value(&self) -> &[u8] {
        match self {
            ShardCell::Full(c) => &c.value,
            ShardCell::Thin(c) => &c.value,
        }
    }

    fn family(&self) -> &str {
        match self {
            ShardCell::Full(c) => &c.family,
            ShardCell::Thin(_) => "",
        }
    }
}

impl Ord for ShardCell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row_key()
            .cmp(other.row_key())
            .then_with(|| self.family().cmp(other.family()))
            .then_with(|| self.qualifier().cmp(other.qualifier()))
    }
}

impl PartialOrd for ShardCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(key: &[u8], qualifier: &str) -> ShardCell {
        ShardCell::Full(Cell {
            row_key: key.to_vec(),
            family: "cf".into(),
            qualifier: qualifier.into(),
            timestamp: 1,
            value: vec![],
        })
    }

    #[test]
    fn cells_order_by_key_then_qualifier() {
        let mut cells = vec![full(b"b", "a"), full(b"a", "b"), full(b"a", "a")];
        cells.sort();
        assert_eq!(cells[0].row_key(), b"a");
        assert_eq!(cells[0].qualifier(), "a");
        assert_eq!(cells[2].row_key(), b"b");
    }
}
