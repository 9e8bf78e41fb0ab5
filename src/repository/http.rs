//! HTTP Signal Repository
//!
//! Talks to the remediation service's REST surface:
//! `GET /api/signals` and `POST /api/signals/{id}/{action}`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{SignalAction, SignalRepository};
use crate::config::SyncConfig;
use crate::error::RepositoryError;
use crate::signal::{Signal, SignalId};

pub struct HttpSignalRepository {
    client: Client,
    base_url: String,
}

impl HttpSignalRepository {
    pub fn new(config: &SyncConfig) -> Result<Self, RepositoryError> {
        let client = Client::builder()
            .user_agent(concat!("healflow/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RepositoryError::Transport(e.to_string()))?;

        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn signals_url(&self) -> String {
        format!("{}/api/signals", self.base_url)
    }

    fn action_url(&self, id: &SignalId, action: SignalAction) -> String {
        let id = urlencoding::encode(id.as_str());
        format!("{}/api/signals/{}/{}", self.base_url, id, action.name())
    }
}

#[async_trait]
impl SignalRepository for HttpSignalRepository {
    async fn list(&self) -> Result<Vec<Signal>, RepositoryError> {
        let url = self.signals_url();
        debug!(%url, "fetching signals");

        let signals = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Signal>>()
            .await?;

        Ok(signals)
    }

    async fn mutate(&self, id: &SignalId, action: SignalAction) -> Result<(), RepositoryError> {
        let url = self.action_url(id, action);
        debug!(%url, %action, "posting signal action");

        let mut request = self.client.post(&url);
        if let SignalAction::Feedback(vote) = action {
            request = request.json(&json!({ "vote": vote }));
        }

        // Body is ignored; the next refresh is the source of truth.
        request.send().await?.error_for_status()?;
        Ok(())
    }
}
