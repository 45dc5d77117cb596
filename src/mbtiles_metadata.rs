//! Reads the `metadata` table of an MBTiles package.
//!
//! Extraction never fails: every field is attempted on its own and falls
//! back to its default when absent or malformed. The [`FieldReport`] that
//! comes with the result says which fields were actually read, so callers
//! (and tests) can tell a clean package from a defaulted one.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;

/// Colorado, which is what every bundled dataset covers.
pub const DEFAULT_BOUNDS: [f64; 4] = [-109.05, 36.99, -102.04, 41.00];
pub const DEFAULT_MINZOOM: u8 = 0;
pub const DEFAULT_MAXZOOM: u8 = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct TilePackageMetadata {
    /// west, south, east, north
    pub bounds: [f64; 4],
    pub minzoom: u8,
    pub maxzoom: u8,
    pub vector_layers: Vec<Value>,
    /// Every text-convertible row of the metadata table.
    pub metadata: BTreeMap<String, String>,
}

impl Default for TilePackageMetadata {
    fn default() -> Self {
        Self {
            bounds: DEFAULT_BOUNDS,
            minzoom: DEFAULT_MINZOOM,
            maxzoom: DEFAULT_MAXZOOM,
            vector_layers: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStatus {
    Parsed,
    Absent,
    Malformed(String),
}

impl FieldStatus {
    pub fn is_parsed(&self) -> bool {
        matches!(self, FieldStatus::Parsed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    pub bounds: FieldStatus,
    pub minzoom: FieldStatus,
    pub maxzoom: FieldStatus,
    pub vector_layers: FieldStatus,
}

impl FieldReport {
    fn fields(&self) -> [(&'static str, &FieldStatus); 4] {
        [
            ("bounds", &self.bounds),
            ("minzoom", &self.minzoom),
            ("maxzoom", &self.maxzoom),
            ("vector_layers", &self.vector_layers),
        ]
    }

    pub fn all_parsed(&self) -> bool {
        self.fields().iter().all(|(_, status)| status.is_parsed())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionReport {
    Read(FieldReport),
    /// The package could not be opened or its metadata table queried.
    Unreadable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
    FullyParsed,
    PartiallyDefaulted,
    Unreadable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub metadata: TilePackageMetadata,
    pub report: ExtractionReport,
}

impl Extraction {
    pub fn outcome(&self) -> ExtractionOutcome {
        match &self.report {
            ExtractionReport::Unreadable(_) => ExtractionOutcome::Unreadable,
            ExtractionReport::Read(fields) if fields.all_parsed() => {
                ExtractionOutcome::FullyParsed
            }
            ExtractionReport::Read(_) => ExtractionOutcome::PartiallyDefaulted,
        }
    }

    pub fn into_metadata(self) -> TilePackageMetadata {
        self.metadata
    }
}

pub fn extract_metadata(path: &Path) -> Extraction {
    let raw = match read_metadata_table(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!("Error reading {}: {}", path.display(), err);
            return Extraction {
                metadata: TilePackageMetadata::default(),
                report: ExtractionReport::Unreadable(err.to_string()),
            };
        }
    };

    let (metadata, fields) = interpret_metadata(raw);

    for (field, status) in fields.fields() {
        match status {
            FieldStatus::Parsed => {}
            FieldStatus::Absent => {
                tracing::debug!("{}: no {} in metadata, using default", path.display(), field)
            }
            FieldStatus::Malformed(reason) => {
                tracing::warn!(
                    "{}: malformed {} ({}), using default",
                    path.display(),
                    field,
                    reason
                )
            }
        }
    }

    Extraction {
        metadata,
        report: ExtractionReport::Read(fields),
    }
}

fn read_metadata_table(path: &Path) -> rusqlite::Result<BTreeMap<String, String>> {
    let connection = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    // language=SQL
    let mut statement = connection.prepare("SELECT name, value FROM metadata;")?;
    let rows = statement.query_map([], |row| {
        Ok((row.get::<_, SqlValue>(0)?, row.get::<_, SqlValue>(1)?))
    })?;

    let mut metadata = BTreeMap::new();

    for row in rows {
        let (name, value) = row?;

        let SqlValue::Text(name) = name else {
            continue;
        };

        let value = match value {
            SqlValue::Text(text) => text,
            SqlValue::Integer(int) => int.to_string(),
            SqlValue::Real(real) => real.to_string(),
            SqlValue::Null | SqlValue::Blob(_) => continue,
        };

        metadata.insert(name, value);
    }

    Ok(metadata)
}

fn interpret_metadata(raw: BTreeMap<String, String>) -> (TilePackageMetadata, FieldReport) {
    let (bounds, bounds_status) = match raw.get("bounds") {
        None => (DEFAULT_BOUNDS, FieldStatus::Absent),
        Some(value) => match parse_bounds(value) {
            Ok(bounds) => (bounds, FieldStatus::Parsed),
            Err(reason) => (DEFAULT_BOUNDS, FieldStatus::Malformed(reason)),
        },
    };

    let (mut minzoom, mut minzoom_status) = zoom_field(&raw, "minzoom", DEFAULT_MINZOOM);
    let (mut maxzoom, mut maxzoom_status) = zoom_field(&raw, "maxzoom", DEFAULT_MAXZOOM);

    if minzoom > maxzoom {
        let reason = format!("minzoom {minzoom} is greater than maxzoom {maxzoom}");

        for status in [&mut minzoom_status, &mut maxzoom_status] {
            if status.is_parsed() {
                *status = FieldStatus::Malformed(reason.clone());
            }
        }

        minzoom = DEFAULT_MINZOOM;
        maxzoom = DEFAULT_MAXZOOM;
    }

    let (vector_layers, vector_layers_status) = vector_layers_field(&raw);

    (
        TilePackageMetadata {
            bounds,
            minzoom,
            maxzoom,
            vector_layers,
            metadata: raw,
        },
        FieldReport {
            bounds: bounds_status,
            minzoom: minzoom_status,
            maxzoom: maxzoom_status,
            vector_layers: vector_layers_status,
        },
    )
}

/// Parses `west,south,east,north`.
pub fn parse_bounds(raw: &str) -> Result<[f64; 4], String> {
    let values = raw
        .split(',')
        .map(str::trim)
        .map(|part| match part.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(_) => Err(format!("{part:?} is not a finite number")),
            Err(err) => Err(format!("{part:?}: {err}")),
        })
        .collect::<Result<Vec<f64>, String>>()?;

    let count = values.len();

    <[f64; 4]>::try_from(values)
        .map_err(|_| format!("expected 4 comma-separated values, found {count}"))
}

pub fn parse_zoom(raw: &str) -> Result<u8, String> {
    raw.trim()
        .parse::<u8>()
        .map_err(|err| format!("{raw:?}: {err}"))
}

fn zoom_field(raw: &BTreeMap<String, String>, key: &str, default: u8) -> (u8, FieldStatus) {
    match raw.get(key) {
        None => (default, FieldStatus::Absent),
        Some(value) => match parse_zoom(value) {
            Ok(zoom) => (zoom, FieldStatus::Parsed),
            Err(reason) => (default, FieldStatus::Malformed(reason)),
        },
    }
}

fn vector_layers_field(raw: &BTreeMap<String, String>) -> (Vec<Value>, FieldStatus) {
    let Some(json) = raw.get("json") else {
        return (Vec::new(), FieldStatus::Absent);
    };

    match serde_json::from_str::<Value>(json) {
        Err(err) => (Vec::new(), FieldStatus::Malformed(format!("json: {err}"))),
        Ok(Value::Object(mut document)) => match document.remove("vector_layers") {
            None => (Vec::new(), FieldStatus::Absent),
            Some(Value::Array(layers)) => (layers, FieldStatus::Parsed),
            Some(_) => (
                Vec::new(),
                FieldStatus::Malformed(String::from("vector_layers is not an array")),
            ),
        },
        Ok(_) => (
            Vec::new(),
            FieldStatus::Malformed(String::from("json is not an object")),
        ),
    }
}
