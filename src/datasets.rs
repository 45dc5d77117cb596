use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tilejson::{Bounds, TileJSON, VectorLayer};

use crate::catalog::{CatalogEntry, DATASET_CATALOG, StylingOptions, catalog_entry};
use crate::dataset_id::DatasetId;
use crate::mbtiles_metadata::extract_metadata;
use crate::style_resolver::tile_url_template;

pub const DATASET_TYPE: &str = "vector";
pub const DATASET_FORMAT: &str = "mbtiles";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub format: &'static str,
    pub bounds: [f64; 4],
    pub minzoom: u8,
    pub maxzoom: u8,
    pub vector_layers: Vec<Value>,
    pub styling_options: StylingOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetsResponse {
    pub datasets: Vec<Dataset>,
}

impl Dataset {
    /// TileJSON 3.0.0 for this dataset, using its own zoom range and bounds.
    pub fn tilejson(&self, tile_server_url: &str) -> TileJSON {
        let [west, south, east, north] = self.bounds;

        // layers that do not fit the TileJSON shape (no id, etc.) are left out
        let vector_layers = self
            .vector_layers
            .iter()
            .filter_map(|layer| serde_json::from_value::<VectorLayer>(layer.clone()).ok())
            .collect::<Vec<VectorLayer>>();

        TileJSON {
            vector_layers: Some(vector_layers),
            tilejson: String::from("3.0.0"),
            bounds: Some(Bounds::new(west, south, east, north)),
            center: None,
            data: None,
            description: None,
            fillzoom: None,
            grids: None,
            legend: None,
            maxzoom: Some(self.maxzoom),
            minzoom: Some(self.minzoom),
            name: Some(self.name.to_string()),
            scheme: None,
            template: None,
            version: None,
            other: BTreeMap::new(),
            tiles: vec![tile_url_template(tile_server_url, &self.id)],
            attribution: None,
        }
    }
}

/// Every catalog dataset whose package exists under `mbtiles_dir`, in
/// catalog order. Rebuilt from disk on each call.
pub fn list_datasets(mbtiles_dir: &Path) -> Vec<Dataset> {
    DATASET_CATALOG
        .iter()
        .filter_map(|entry| load_dataset(mbtiles_dir, entry))
        .collect()
}

pub fn find_dataset(mbtiles_dir: &Path, dataset_id: &DatasetId) -> Option<Dataset> {
    catalog_entry(dataset_id.as_str()).and_then(|entry| load_dataset(mbtiles_dir, entry))
}

fn load_dataset(mbtiles_dir: &Path, entry: &'static CatalogEntry) -> Option<Dataset> {
    let id = match DatasetId::parse(entry.id) {
        Ok(id) => id,
        Err(err) => {
            tracing::error!("catalog entry {:?} has an invalid id: {}", entry.id, err);
            return None;
        }
    };

    let package_path = mbtiles_dir.join(id.package_file_name());

    if !package_path.exists() {
        tracing::debug!("{} not found, skipping {}", package_path.display(), id);
        return None;
    }

    let metadata = extract_metadata(&package_path).into_metadata();

    Some(Dataset {
        id,
        name: entry.name,
        kind: DATASET_TYPE,
        format: DATASET_FORMAT,
        bounds: metadata.bounds,
        minzoom: metadata.minzoom,
        maxzoom: metadata.maxzoom,
        vector_layers: metadata.vector_layers,
        styling_options: entry.styling_options,
    })
}
