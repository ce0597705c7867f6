use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::{config::Config, dto::tag::ImageTagList, error::TaggerError};

use super::Registry;

/// Client for the Quay v1 REST api.
pub struct QuayClient {
    client: Client,
    api_url: String,
    token: String,
}

impl QuayClient {
    pub fn new(api_url: &str, token: &str, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(&config.quay_url, &config.quay_token, config.request_timeout())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// The body Quay expects when creating a tag.
///
/// Written by hand so the bytes on the wire stay exactly `{"image": "<id>"}`.
pub fn tag_body(image: &str) -> String {
    format!("{{\"image\": {}}}", serde_json::Value::from(image))
}

#[async_trait]
impl Registry for QuayClient {
    async fn list_tags(&self, repository: &str, tag: &str) -> Result<ImageTagList, TaggerError> {
        let url = format!("{}/repository/{}/tag/", self.api_url, repository);
        debug!("Looking up tag history at {} for '{}'", url, tag);

        let res = self.client.get(&url)
            .query(&[("specificTag", tag)])
            .bearer_auth(&self.token)
            .send().await
            .map_err(TaggerError::RegistryUnreachable)?;

        let status = res.status();
        let body = res.bytes().await
            .map_err(TaggerError::RegistryUnreachable)?;

        if !status.is_success() {
            debug!("Tag lookup for {} answered with {}", repository, status);
        }

        serde_json::from_slice(&body)
            .map_err(TaggerError::RegistryResponseInvalid)
    }

    async fn create_tag(&self, repository: &str, tag: &str, image: &str) -> Result<(), TaggerError> {
        let publish_err = |source: reqwest::Error| TaggerError::PublishFailed {
            tag: tag.to_string(),
            image: image.to_string(),
            source,
        };

        let url = format!("{}/repository/{}/tag/{}", self.api_url, repository, tag);
        let req = self.client.put(&url)
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(tag_body(image))
            .build()
            .map_err(publish_err)?;

        let res = self.client.execute(req).await
            .map_err(publish_err)?;

        // the call went through, whatever quay thinks of it is only worth a log line
        if !res.status().is_success() {
            warn!(repository, tag, image, status = %res.status(), "Registry did not accept tag");
        }

        Ok(())
    }
}
