use serde::Deserialize;

use super::nullable;

/// One page of a repository's tag history, as returned by
/// `GET /repository/{repository}/tag/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageTagList {
    /// More pages exist. Only the first page is ever consulted.
    #[serde(default, deserialize_with = "nullable")]
    pub has_additional: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub page: u32,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<TagEntry>,
}

/// A binding of a tag name to an image at some point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TagEntry {
    #[serde(default, deserialize_with = "nullable")]
    pub reversion: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub start_ts: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub docker_image_id: String,
    #[serde(default)]
    pub end_ts: Option<i64>,
}

impl TagEntry {
    /// Returns `true` if this entry is the current binding of the tag name.
    ///
    /// Superseded bindings carry the timestamp they ended at.
    pub fn is_active(&self) -> bool {
        self.end_ts.unwrap_or(0) == 0
    }
}

impl ImageTagList {
    /// Entries that are currently bound, in the order the registry listed them.
    pub fn active(&self) -> impl Iterator<Item = &TagEntry> {
        self.tags.iter().filter(|t| t.is_active())
    }
}
