//! Authenticated HTTP client for the PPLIP API
//!
//! Attaches the stored access token to every request, unwraps the response
//! envelope, and hands failed envelopes to the refresh coordinator.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;
use super::refresh::RefreshCoordinator;
use super::transport::{dispatch, ApiRequest, HttpBackend, ReqwestBackend};
use crate::auth::{CredentialStore, FileTokenStorage, LoginPrompt, Navigator};
use crate::config::Config;

/// Cheap to clone; clones share the backend, credentials and refresh state.
#[derive(Clone)]
pub struct ApiClient {
    backend: Arc<dyn HttpBackend>,
    credentials: CredentialStore,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    pub fn new(
        backend: Arc<dyn HttpBackend>,
        credentials: CredentialStore,
        navigator: Arc<dyn Navigator>,
        max_pending: usize,
    ) -> Self {
        let refresh =
            RefreshCoordinator::new(backend.clone(), credentials.clone(), navigator, max_pending);
        Self {
            backend,
            credentials,
            refresh,
        }
    }

    /// Client backed by the on-disk credentials and a real HTTP transport.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = FileTokenStorage::new(Config::credentials_path()?);
        let credentials = CredentialStore::open(Arc::new(storage));
        let backend = ReqwestBackend::new(config, credentials.session_cookies().as_deref())
            .context("Failed to set up HTTP client")?;

        tracing::debug!("API base URL {}", config.base_url);
        Ok(Self::new(
            Arc::new(backend),
            credentials,
            Arc::new(LoginPrompt),
            config.max_pending_requests,
        ))
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Send a request and return the envelope payload.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let token = self.credentials.token();
        let envelope = dispatch(self.backend.as_ref(), &request, token.as_deref()).await?;
        match envelope.into_result() {
            Ok(payload) => Ok(payload),
            Err(rejection) => self.refresh.handle_rejection(request, rejection).await,
        }
    }

    /// Send a request and deserialize the payload.
    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let payload = self.send(request).await?;
        serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Persist whatever session cookies the server has set so far.
    pub fn save_session_cookies(&self) {
        self.credentials
            .set_session_cookies(self.backend.session_cookies());
    }

    #[cfg(test)]
    pub(crate) fn coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{test_client, MockBackend};
    use crate::api::Envelope;
    use serde::Deserialize;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_attaches_stored_token() {
        let backend = Arc::new(MockBackend::echo());
        let (client, _, _) = test_client(backend.clone(), Some("tok1"));

        assert_ok!(client.send(ApiRequest::get("/notice")).await);

        assert_eq!(backend.last_call().token.as_deref(), Some("tok1"));
    }

    #[tokio::test]
    async fn test_anonymous_request_has_no_token() {
        let backend = Arc::new(MockBackend::echo());
        let (client, _, _) = test_client(backend.clone(), None);

        assert_ok!(client.send(ApiRequest::get("/notice")).await);

        assert_eq!(backend.last_call().token, None);
    }

    #[tokio::test]
    async fn test_send_as_decodes_payload() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Echo {
            method: String,
            path: String,
        }

        let backend = Arc::new(MockBackend::echo());
        let (client, _, _) = test_client(backend, None);

        let echo: Echo = assert_ok!(client.send_as(ApiRequest::put("/freeboard/3")).await);
        assert_eq!(
            echo,
            Echo {
                method: "PUT".to_string(),
                path: "/freeboard/3".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_send_as_reports_shape_mismatch() {
        let backend = Arc::new(MockBackend::new(|_, _| Ok(Envelope::ok(json!("plain")))));
        let (client, _, _) = test_client(backend, None);

        let err = assert_err!(client.send_as::<Vec<u32>>(ApiRequest::get("/x")).await);
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_save_session_cookies() {
        let backend = Arc::new(MockBackend::echo().with_cookies("refreshToken=r1"));
        let (client, storage, _) = test_client(backend, None);

        client.save_session_cookies();

        assert_eq!(
            storage.stored().unwrap().session_cookies.as_deref(),
            Some("refreshToken=r1")
        );
    }
}
