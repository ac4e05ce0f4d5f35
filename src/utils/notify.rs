//! Download-increment notification.
//!
//! When a user downloads an item's asset, the site is told so it can bump
//! the item's counter. The request is fire-and-forget: it runs on its own
//! task, is never retried and a failure is only logged.

use tokio::task::JoinHandle;
use url::Url;

use super::http::HttpClient;
use crate::config::NotifyConfig;
use crate::models::ItemId;

/// Receiver of download events from the controller
pub trait DownloadSink: Send + Sync {
    /// Called once per download; must not block
    fn download_started(&self, id: &ItemId);
}

/// Errors from the notification request
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Endpoint template has no {{id}} placeholder: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server answered {0}")]
    Status(reqwest::StatusCode),
}

/// Posts download increments to the site
#[derive(Debug, Clone)]
pub struct DownloadNotifier {
    http: HttpClient,
    base_url: Url,
    endpoint: String,
    csrf_token: Option<String>,
}

impl DownloadNotifier {
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        if !config.endpoint.contains("{id}") {
            return Err(NotifyError::InvalidEndpoint(config.endpoint.clone()));
        }
        Ok(Self {
            http: HttpClient::new(config.timeout())?,
            base_url: Url::parse(&config.base_url)?,
            endpoint: config.endpoint.clone(),
            csrf_token: config.csrf_token.clone(),
        })
    }

    /// Absolute URL of the increment endpoint for `id`
    pub fn endpoint_for(&self, id: &ItemId) -> Result<Url, NotifyError> {
        let path = self
            .endpoint
            .replace("{id}", &urlencoding::encode(id.as_str()));
        Ok(self.base_url.join(&path)?)
    }

    /// Send the notification and wait for the answer
    pub async fn send(&self, id: &ItemId) -> Result<(), NotifyError> {
        let url = self.endpoint_for(id)?;
        tracing::debug!(%id, %url, "Sending download increment");

        let mut request = self
            .http
            .client()
            .post(url)
            .json(&serde_json::json!({}));
        if let Some(token) = &self.csrf_token {
            request = request.header("X-CSRFToken", token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }
        Ok(())
    }

    /// Send on a background task; failures are logged, never surfaced.
    ///
    /// Returns `None` when called outside a tokio runtime.
    pub fn spawn_notify(&self, id: &ItemId) -> Option<JoinHandle<()>> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(%id, "No async runtime, download increment not sent");
                return None;
            }
        };

        let notifier = self.clone();
        let id = id.clone();
        Some(handle.spawn(async move {
            if let Err(e) = notifier.send(&id).await {
                tracing::warn!(%id, error = %e, "Download increment failed");
            }
        }))
    }
}

impl DownloadSink for DownloadNotifier {
    fn download_started(&self, id: &ItemId) {
        self.spawn_notify(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> NotifyConfig {
        NotifyConfig {
            base_url: base_url.to_string(),
            csrf_token: Some("tok".to_string()),
            ..NotifyConfig::default()
        }
    }

    #[test]
    fn test_endpoint_for_encodes_id() {
        let notifier = DownloadNotifier::from_config(&config("http://localhost:8000")).unwrap();
        let url = notifier.endpoint_for(&ItemId::from("a b")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/publicacoes/incrementar-download/a%20b/"
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            DownloadNotifier::from_config(&config("not a url")),
            Err(NotifyError::InvalidUrl(_))
        ));

        let mut bad = config("http://localhost:8000");
        bad.endpoint = "/downloads/".to_string();
        assert!(matches!(
            DownloadNotifier::from_config(&bad),
            Err(NotifyError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_spawn_outside_runtime_is_none() {
        let notifier = DownloadNotifier::from_config(&config("http://localhost:8000")).unwrap();
        assert!(notifier.spawn_notify(&ItemId::from("7")).is_none());
    }

    #[tokio::test]
    async fn test_send_posts_with_csrf_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/publicacoes/incrementar-download/7/")
            .match_header("x-csrftoken", "tok")
            .match_body(mockito::Matcher::Json(serde_json::json!({})))
            .with_status(200)
            .create_async()
            .await;

        let notifier = DownloadNotifier::from_config(&config(&server.url())).unwrap();
        notifier.send(&ItemId::from(7u64)).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_reports_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/publicacoes/incrementar-download/7/")
            .with_status(500)
            .create_async()
            .await;

        let notifier = DownloadNotifier::from_config(&config(&server.url())).unwrap();
        let result = notifier.send(&ItemId::from("7")).await;
        assert!(matches!(result, Err(NotifyError::Status(s)) if s.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_spawned_failure_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/publicacoes/incrementar-download/9/")
            .with_status(403)
            .create_async()
            .await;

        let notifier = DownloadNotifier::from_config(&config(&server.url())).unwrap();
        let handle = notifier.spawn_notify(&ItemId::from("9")).unwrap();
        handle.await.unwrap();
        mock.assert_async().await;
    }
}
