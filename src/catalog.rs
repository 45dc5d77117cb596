//! Static per-dataset configuration: display names and the styling menus
//! offered to the frontend. Built at compile time, never mutated.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StylingOptions {
    pub categorical_fields: &'static [&'static str],
    pub numeric_fields: &'static [&'static str],
    pub available_templates: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub styling_options: StylingOptions,
}

pub const DATASET_CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: "co_power_lines",
        name: "Power Lines",
        styling_options: StylingOptions {
            categorical_fields: &["voltage", "line_type"],
            numeric_fields: &["voltage"],
            available_templates: &["power_by_voltage"],
        },
    },
    CatalogEntry {
        id: "co_railways",
        name: "Railways",
        styling_options: StylingOptions {
            categorical_fields: &["usage", "type"],
            numeric_fields: &[],
            available_templates: &["railways_by_usage"],
        },
    },
    CatalogEntry {
        id: "co_roads",
        name: "Roads",
        styling_options: StylingOptions {
            categorical_fields: &["highway", "surface"],
            numeric_fields: &["lanes"],
            available_templates: &["roads_by_type"],
        },
    },
];

pub fn catalog_entry(id: &str) -> Option<&'static CatalogEntry> {
    DATASET_CATALOG.iter().find(|entry| entry.id == id)
}
