use std::time::Duration;

use crate::common::Dataset;
use crate::error::LoadError;

/// Fetches the full dataset from the upstream data source, once.
pub struct DataLoader {
    url: String,
    timeout: Duration,
}

impl DataLoader {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    /// Single attempt, no retry. The caller decides what a failure means.
    pub async fn fetch(&self) -> Result<Dataset, LoadError> {
        log::info!("Fetching initial dataset from {}", self.url);

        let transport = |source| LoadError::Transport {
            url: self.url.clone(),
            source,
        };

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(transport)?;
        let response = client.get(&self.url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        parse_dataset(&body)
    }
}

pub fn parse_dataset(body: &[u8]) -> Result<Dataset, LoadError> {
    Ok(serde_json::from_slice::<Dataset>(body)?)
}
