//! HTTP coordination client.
//!
//! Holds one session against the coordination server and keeps it alive from a background
//! task, so this instance's ephemeral entries vanish only when the process stops.

use super::coordination::{CoordinationError, CoordinationService, Result};
use super::protocol::*;
use super::types::SessionId;

use anyhow::Context;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpCoordination {
    base_url: String,
    session: SessionId,
    http_client: reqwest::Client,
    keepalive: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl HttpCoordination {
    /// Opens a session against `base_url`.
    ///
    /// Fails if the server does not answer the first keepalive.
    pub async fn connect(base_url: &str, session_ttl: Duration) -> anyhow::Result<Arc<Self>> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let client = Arc::new(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session: SessionId::new(),
            http_client,
            keepalive: Mutex::new(None),
        });

        client
            .send_keepalive()
            .await
            .with_context(|| format!("coordination service unreachable at {}", base_url))?;

        let handle = client.spawn_keepalive(session_ttl / 3);
        *client
            .keepalive
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        tracing::info!(
            "Connected to coordination service {} (session {})",
            client.base_url,
            client.session.0
        );

        Ok(client)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send_keepalive(&self) -> Result<()> {
        let response = self
            .http_client
            .post(self.url(ENDPOINT_SESSION_KEEPALIVE))
            .json(&SessionRequest {
                session: self.session.clone(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoordinationError::Protocol(format!(
                "keepalive failed: {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn spawn_keepalive(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let http_client = self.http_client.clone();
        let url = self.url(ENDPOINT_SESSION_KEEPALIVE);
        let request = SessionRequest {
            session: self.session.clone(),
        };
        let every = every.max(Duration::from_millis(100));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match http_client.post(&url).json(&request).send().await {
                    Ok(response) if response.status().is_success() => {
                        tracing::trace!("Renewed coordination session {}", request.session.0);
                    }
                    Ok(response) => {
                        tracing::warn!("Session keepalive rejected: {}", response.status());
                    }
                    Err(e) => {
                        tracing::warn!("Session keepalive failed: {}", e);
                    }
                }
            }
        })
    }

    fn stop_keepalive(&self) {
        if let Some(handle) = self
            .keepalive
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

impl CoordinationService for HttpCoordination {
    fn session(&self) -> &SessionId {
        &self.session
    }

    async fn create_ephemeral_entry(&self, path: &str, payload: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url(ENDPOINT_ENTRIES))
            .json(&CreateEntryRequest {
                session: self.session.clone(),
                path: path.to_string(),
                payload: payload.to_string(),
            })
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::CREATED => Ok(()),
            reqwest::StatusCode::CONFLICT => Err(CoordinationError::NodeExists(path.to_string())),
            status => Err(CoordinationError::Protocol(format!(
                "create {} failed: {}",
                path, status
            ))),
        }
    }

    async fn list_children(&self, path: &str) -> Result<Vec<String>> {
        let response = self
            .http_client
            .get(self.url(ENDPOINT_ENTRY_CHILDREN))
            .query(&[("path", path)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoordinationError::Protocol(format!(
                "list {} failed: {}",
                path,
                response.status()
            )));
        }

        let children: ChildrenResponse = response.json().await?;
        Ok(children.children)
    }

    async fn entry_exists(&self, path: &str) -> Result<bool> {
        let response = self
            .http_client
            .get(self.url(ENDPOINT_ENTRY_EXISTS))
            .query(&[("path", path)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoordinationError::Protocol(format!(
                "exists {} failed: {}",
                path,
                response.status()
            )));
        }

        let exists: ExistsResponse = response.json().await?;
        Ok(exists.exists)
    }

    async fn entry_owner(&self, path: &str) -> Result<Option<SessionId>> {
        let response = self
            .http_client
            .get(self.url(ENDPOINT_ENTRY_OWNER))
            .query(&[("path", path)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoordinationError::Protocol(format!(
                "owner of {} failed: {}",
                path,
                response.status()
            )));
        }

        let owner: OwnerResponse = response.json().await?;
        Ok(owner.session)
    }

    async fn delete_entry(&self, path: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(self.url(ENDPOINT_ENTRIES))
            .query(&[("path", path)])
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(()),
            reqwest::StatusCode::NOT_FOUND => Err(CoordinationError::NoNode(path.to_string())),
            status => Err(CoordinationError::Protocol(format!(
                "delete {} failed: {}",
                path, status
            ))),
        }
    }

    async fn close(&self) {
        self.stop_keepalive();

        let closed = self
            .http_client
            .post(self.url(ENDPOINT_SESSION_CLOSE))
            .json(&SessionRequest {
                session: self.session.clone(),
            })
            .send()
            .await;

        if let Err(e) = closed {
            tracing::warn!("Failed to close coordination session {}: {}", self.session.0, e);
        }
    }
}

impl Drop for HttpCoordination {
    fn drop(&mut self) {
        self.stop_keepalive();
    }
}
