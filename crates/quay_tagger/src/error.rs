use thiserror::Error;

/// Everything that can go wrong while turning a build notification into a tag.
///
/// None of these are surfaced to the webhook caller, they are logged where they
/// happen and the request is still acknowledged.
#[derive(Debug, Error)]
pub enum TaggerError {
    #[error("malformed build event: {0}")]
    MalformedEvent(#[source] serde_json::Error),
    #[error("build has no tags")]
    NoTaggableImage,
    #[error("registry unreachable: {0}")]
    RegistryUnreachable(#[source] reqwest::Error),
    #[error("invalid registry response: {0}")]
    RegistryResponseInvalid(#[source] serde_json::Error),
    #[error("failed to publish tag '{tag}' for image '{image}': {source}")]
    PublishFailed {
        tag: String,
        image: String,
        #[source]
        source: reqwest::Error,
    },
}
