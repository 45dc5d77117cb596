use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub const MAX_DATASET_ID_LEN: usize = 128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidDatasetId {
    #[error("dataset id is empty")]
    Empty,
    #[error("dataset id is longer than {MAX_DATASET_ID_LEN} characters")]
    TooLong,
    #[error("dataset id contains forbidden character {character:?} at position {position}")]
    ForbiddenCharacter { character: char, position: usize },
}

/// Identifier of a dataset, safe to interpolate into file names.
///
/// Only ASCII letters, digits and `_` are accepted, so an id can never name
/// a parent directory or carry a path separator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn parse(raw: &str) -> Result<DatasetId, InvalidDatasetId> {
        if raw.is_empty() {
            return Err(InvalidDatasetId::Empty);
        }

        if let Some((position, character)) = raw
            .chars()
            .enumerate()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(InvalidDatasetId::ForbiddenCharacter {
                character,
                position,
            });
        }

        // every char is ASCII at this point, so bytes == chars
        if raw.len() > MAX_DATASET_ID_LEN {
            return Err(InvalidDatasetId::TooLong);
        }

        Ok(DatasetId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn package_file_name(&self) -> String {
        format!("{}.mbtiles", self.0)
    }

    pub fn style_file_name(&self) -> String {
        format!("{}_style.json", self.0)
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatasetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
