pub mod quay;

use async_trait::async_trait;

use crate::{dto::tag::ImageTagList, error::TaggerError};

pub use quay::QuayClient;

#[async_trait]
pub trait Registry: Send + Sync {
    /// Get the history of a tag name in a repository.
    ///
    /// Parameters:
    /// * `repository` - The repository path, `namespace/name`.
    /// * `tag` - The tag name to filter the history on.
    ///
    /// Only the first page of the history is returned.
    async fn list_tags(&self, repository: &str, tag: &str) -> Result<ImageTagList, TaggerError>;

    /// Create a tag, or move an existing one, so it points at `image`.
    ///
    /// Parameters:
    /// * `repository` - The repository the tag will be created inside.
    /// * `tag` - The name of the tag to create.
    /// * `image` - The image identifier the tag should resolve to.
    async fn create_tag(&self, repository: &str, tag: &str, image: &str) -> Result<(), TaggerError>;
}
