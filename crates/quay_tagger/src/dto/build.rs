use serde::Deserialize;

use crate::error::TaggerError;

use super::nullable;

/// A build completion notification sent by Quay's build service.
///
/// Only `repository`, `build_name` and `docker_tags` drive tagging, the rest
/// of the payload is kept around for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuildEvent {
    /// Full repository path, `namespace/name`.
    #[serde(default, deserialize_with = "nullable")]
    pub repository: String,
    #[serde(default, deserialize_with = "nullable")]
    pub namespace: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub docker_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub homepage: String,
    #[serde(default, deserialize_with = "nullable")]
    pub visibility: String,
    #[serde(default, deserialize_with = "nullable")]
    pub build_id: String,
    /// The stable name the built image gets published under.
    #[serde(default, deserialize_with = "nullable")]
    pub build_name: String,
    /// Tags the build pushed. The first one is used to find the image.
    #[serde(default, deserialize_with = "nullable")]
    pub docker_tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub trigger_kind: String,
    #[serde(default, deserialize_with = "nullable")]
    pub trigger_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub trigger_metadata: TriggerMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TriggerMetadata {
    #[serde(default, deserialize_with = "nullable")]
    pub default_branch: String,
    #[serde(default, rename = "ref", deserialize_with = "nullable")]
    pub git_ref: String,
    #[serde(default, deserialize_with = "nullable")]
    pub commit: String,
    #[serde(default, deserialize_with = "nullable")]
    pub commit_info: CommitInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommitInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub message: String,
    #[serde(default, deserialize_with = "nullable")]
    pub date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub author: GitUser,
    #[serde(default, deserialize_with = "nullable")]
    pub committer: GitUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GitUser {
    #[serde(default, deserialize_with = "nullable")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar_url: String,
}

impl BuildEvent {
    /// Parse a raw webhook body.
    pub fn from_slice(body: &[u8]) -> Result<Self, TaggerError> {
        serde_json::from_slice(body).map_err(TaggerError::MalformedEvent)
    }

    /// The tag the build pushed its image under, used to look the image up.
    ///
    /// Returns `None` when the build produced nothing taggable.
    pub fn primary_tag(&self) -> Option<&str> {
        self.docker_tags.first().map(|t| t.as_str())
    }
}
