// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::arc_with_non_send_sync,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::bytes_nth,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

//! Backend for the MBTiles viewer.
//!
//! Exposes the metadata of a fixed set of MBTiles packages and their style
//! documents to the map frontend. Tiles themselves are served by a separate
//! tile server; this crate only points styles at it.

pub mod catalog;
pub mod config;
pub mod dataset_id;
pub mod datasets;
pub mod mbtiles_metadata;
pub mod routes;
pub mod style_resolver;

#[cfg(test)]
mod test_support;

pub use config::ViewerConfig;
pub use dataset_id::{DatasetId, InvalidDatasetId};
pub use datasets::{Dataset, list_datasets};
pub use mbtiles_metadata::{Extraction, ExtractionOutcome, extract_metadata};
pub use style_resolver::{StyleError, StyleQuery, StyleResolver};
