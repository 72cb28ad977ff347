use almanac_core::{GridLayout, Position, Unit, UnitId};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "almanac";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "almanac:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of a curriculum's units and the learner's completed units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ProgressSnapshot {
    /// Number of columns on each row of the learning path.
    pub(crate) columns: u32,
    /// Number of rows spanned by the units.
    pub(crate) rows: u32,
    /// Units in content-store order.
    pub(crate) units: Vec<Unit>,
    /// Units the learner completed.
    pub(crate) completed: Vec<UnitId>,
}

impl ProgressSnapshot {
    /// Captures a snapshot, deriving the row count from the highest position.
    #[must_use]
    pub(crate) fn capture(layout: GridLayout, units: Vec<Unit>, completed: Vec<UnitId>) -> Self {
        Self {
            columns: layout.columns(),
            rows: rows_spanned(layout, &units),
            units,
            completed,
        }
    }

    /// Layout described by the snapshot's column count.
    pub(crate) fn layout(&self) -> Result<GridLayout, SnapshotError> {
        GridLayout::with_columns(self.columns)
            .ok_or_else(|| SnapshotError::InvalidDimensions(format!("{}x{}", self.columns, self.rows)))
    }

    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, SnapshotError> {
        let payload = SerializableSnapshot {
            units: self.units.clone(),
            completed: self.completed.clone(),
        };
        let json = serde_json::to_vec(&payload).map_err(SnapshotError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.columns, self.rows
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, SnapshotError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SnapshotError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(SnapshotError::MissingPrefix)?;
        let version = parts.next().ok_or(SnapshotError::MissingVersion)?;
        let dimensions = parts.next().ok_or(SnapshotError::MissingDimensions)?;
        let payload = parts.next().ok_or(SnapshotError::MissingPayload)?;
        if parts.next().is_some() {
            return Err(SnapshotError::TrailingSegments);
        }

        if domain != SNAPSHOT_DOMAIN {
            return Err(SnapshotError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(SnapshotError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(SnapshotError::InvalidPayload)?;

        let snapshot = Self {
            columns,
            rows,
            units: decoded.units,
            completed: decoded.completed,
        };
        if rows_spanned(snapshot.layout()?, &snapshot.units) != rows {
            return Err(SnapshotError::InvalidDimensions(dimensions.to_owned()));
        }
        Ok(snapshot)
    }
}

fn rows_spanned(layout: GridLayout, units: &[Unit]) -> u32 {
    units
        .iter()
        .map(|unit| unit.position)
        .max()
        .map_or(0, |highest: Position| layout.rows_for(highest))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableSnapshot {
    units: Vec<Unit>,
    completed: Vec<UnitId>,
}

/// Errors that can occur while encoding or decoding progress snapshots.
#[derive(Debug, Error)]
pub(crate) enum SnapshotError {
    /// The provided string was empty or contained only whitespace.
    #[error("snapshot was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("snapshot is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("snapshot is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    #[error("snapshot is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    #[error("snapshot is missing the payload")]
    MissingPayload,
    /// The encoded snapshot carried segments after the payload.
    #[error("snapshot has unexpected segments after the payload")]
    TrailingSegments,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("snapshot prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("snapshot version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded snapshot.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode snapshot payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not process snapshot payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), SnapshotError> {
    let invalid = || SnapshotError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}
