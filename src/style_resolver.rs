//! Loads per-dataset style documents and points their vector sources at the
//! tile server.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::dataset_id::DatasetId;

// Fixed for every rewritten source, independent of the package's own range.
pub const REWRITTEN_SOURCE_MINZOOM: u8 = 0;
pub const REWRITTEN_SOURCE_MAXZOOM: u8 = 14;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("no style document at {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("I/O error reading style '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed style JSON in '{}': {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Data-driven styling parameters. Accepted so clients can already send
/// them; they do not change the returned document yet.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct StyleQuery {
    pub template: Option<String>,
    pub field: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StyleResolver {
    styles_dir: PathBuf,
    tile_server_url: String,
}

impl StyleResolver {
    pub fn new(styles_dir: impl Into<PathBuf>, tile_server_url: &str) -> Self {
        Self {
            styles_dir: styles_dir.into(),
            tile_server_url: tile_server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn styles_dir(&self) -> &Path {
        &self.styles_dir
    }

    pub fn style_path(&self, dataset_id: &DatasetId) -> PathBuf {
        self.styles_dir.join(dataset_id.style_file_name())
    }

    pub fn resolve(&self, dataset_id: &DatasetId, query: &StyleQuery) -> Result<Value, StyleError> {
        if query.template.is_some() || query.field.is_some() {
            tracing::debug!(
                "style {} requested with template={:?} field={:?}; not applied",
                dataset_id,
                query.template,
                query.field
            );
        }

        let path = self.style_path(dataset_id);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StyleError::NotFound { path });
            }
            Err(source) => return Err(StyleError::Io { path, source }),
        };

        let mut style: Value = match serde_json::from_str(&contents) {
            Ok(style) => style,
            Err(source) => return Err(StyleError::Malformed { path, source }),
        };

        let rewritten = rewrite_vector_sources(&mut style, dataset_id, &self.tile_server_url);
        tracing::debug!("style {}: rewrote {} vector source(s)", dataset_id, rewritten);

        Ok(style)
    }
}

pub fn tile_url_template(tile_server_url: &str, dataset_id: &DatasetId) -> String {
    format!(
        "{}/data/{}/{{z}}/{{x}}/{{y}}.pbf",
        tile_server_url.trim_end_matches('/'),
        dataset_id
    )
}

/// Replaces every `"type": "vector"` entry of the top-level `sources` object
/// with a source served by the tile server. Returns how many were replaced.
pub fn rewrite_vector_sources(
    style: &mut Value,
    dataset_id: &DatasetId,
    tile_server_url: &str,
) -> usize {
    let Some(sources) = style.get_mut("sources").and_then(Value::as_object_mut) else {
        return 0;
    };

    let mut rewritten = 0;

    for source in sources.values_mut() {
        if source.get("type").and_then(Value::as_str) == Some("vector") {
            *source = json!({
                "type": "vector",
                "tiles": [tile_url_template(tile_server_url, dataset_id)],
                "minzoom": REWRITTEN_SOURCE_MINZOOM,
                "maxzoom": REWRITTEN_SOURCE_MAXZOOM,
            });
            rewritten += 1;
        }
    }

    rewritten
}
