use crate::config::Config;
use crate::publisher::TagPublisher;
use crate::registry::QuayClient;

pub struct AppState {
    pub publisher: TagPublisher<QuayClient>,
}

impl AppState {
    pub fn new(publisher: TagPublisher<QuayClient>) -> Self
    {
        Self {
            publisher,
        }
    }

    /// Build the state and the registry client from the config.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let registry = QuayClient::from_config(config)?;
        Ok(Self::new(TagPublisher::new(registry)))
    }
}
