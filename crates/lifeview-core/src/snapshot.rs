#![forbid(unsafe_code)]

//! Snapshot wire types.
//!
//! The server delivers every generation as `{ "positions": [{ "x": i, "y": j },
//! ...] }`, both in the join acknowledgment and in each `tick` push. Payloads
//! are decoded and validated here, before any drawing starts; a rejected
//! payload leaves the previously rendered frame on screen.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

/// One occupied cell in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPosition {
    pub x: i32,
    pub y: i32,
}

impl CellPosition {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// All currently occupied cells. Replaces the previous snapshot wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    positions: Vec<CellPosition>,
}

impl Snapshot {
    #[must_use]
    pub fn new(positions: Vec<CellPosition>) -> Self {
        Self { positions }
    }

    /// Decode and validate a JSON payload.
    pub fn from_json_str(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| ViewerError::MalformedSnapshot(e.to_string()))
    }

    /// Decode and validate an already-parsed JSON value.
    pub fn from_value(payload: serde_json::Value) -> Result<Self> {
        serde_json::from_value(payload).map_err(|e| ViewerError::MalformedSnapshot(e.to_string()))
    }

    #[must_use]
    pub fn positions(&self) -> &[CellPosition] {
        &self.positions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellPosition> + '_ {
        self.positions.iter()
    }
}

impl FromIterator<CellPosition> for Snapshot {
    fn from_iter<I: IntoIterator<Item = CellPosition>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
