//! Client for the remote template store.
//!
//! The store is a small REST service:
//!
//! | Method   | Path              | Purpose            |
//! |----------|-------------------|--------------------|
//! | `GET`    | `/templates`      | list records       |
//! | `GET`    | `/templates/{id}` | fetch one record   |
//! | `POST`   | `/templates`      | create or replace  |
//! | `DELETE` | `/templates/{id}` | delete a record    |
//!
//! A record's `pages` field is the JSON text of the document, not a nested
//! array. Save and delete each allow one request in flight; a second call
//! while one is pending fails with [`RemoteError::Busy`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use template_core::{export_document, import_document, Page};
use thiserror::Error;
use url::Url;

/// Default base URL of the template store.
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Errors talking to the template store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The configured base URL is invalid.
    #[error("invalid template server URL: {0}")]
    InvalidUrl(String),
    /// The server could not be reached.
    #[error("template server unavailable: {0}")]
    Unavailable(String),
    /// The server answered with a non-success status.
    #[error("template server returned {status}: {message}")]
    OperationFailed {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },
    /// The same kind of request is already in flight.
    #[error("a {0} request is already in progress")]
    Busy(&'static str),
    /// The response or stored document could not be decoded.
    #[error("failed to decode template payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Unavailable(error.to_string())
        }
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A stored template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    /// Record id.
    pub id: String,
    /// Display name; older records only carry an id.
    #[serde(default)]
    pub name: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// JSON text of the document's pages.
    pub pages: String,
}

impl TemplateRecord {
    /// The record's display name, falling back to its id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Decode the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Decode`] if the pages are not a valid document.
    pub fn decode_pages(&self) -> RemoteResult<Vec<Page>> {
        import_document(&self.pages).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[derive(Serialize)]
struct SaveRequest<'a> {
    id: &'a str,
    name: &'a str,
    pages: String,
}

/// Clears an in-flight flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, operation: &'static str) -> RemoteResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RemoteError::Busy(operation))?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Asynchronous client for the template store.
#[derive(Clone)]
pub struct TemplateClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base: Url,
    saving: AtomicBool,
    deleting: AtomicBool,
}

impl TemplateClient {
    /// Create a client for the store at `base_url` with a 10 second timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidUrl`] if the URL is malformed or not
    /// HTTP(S).
    pub fn new(base_url: impl AsRef<str>) -> RemoteResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Create a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidUrl`] if the URL is malformed or not
    /// HTTP(S), and [`RemoteError::Unavailable`] if the HTTP client fails to
    /// build.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> RemoteResult<Self> {
        let base = Url::parse(base_url.as_ref())
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base.to_string()));
        }

        let http = Client::builder()
            .user_agent(concat!("template-studio/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                base,
                saving: AtomicBool::new(false),
                deleting: AtomicBool::new(false),
            }),
        })
    }

    /// Base URL of the store.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Whether a save is in flight.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.inner.saving.load(Ordering::Acquire)
    }

    /// Whether a delete is in flight.
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.inner.deleting.load(Ordering::Acquire)
    }

    fn templates_url(&self, id: Option<&str>) -> RemoteResult<Url> {
        let mut url = self.inner.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| RemoteError::InvalidUrl(self.inner.base.to_string()))?;
            segments.pop_if_empty().push("templates");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// List stored templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable, answers with a failure
    /// status, or sends an undecodable body.
    pub async fn list(&self) -> RemoteResult<Vec<TemplateRecord>> {
        let response = self
            .inner
            .http
            .get(self.templates_url(None)?)
            .send()
            .await?;
        let records: Vec<TemplateRecord> = check_status(response).await?.json().await?;
        tracing::debug!(count = records.len(), "Listed templates");
        Ok(records)
    }

    /// Fetch one template.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable, answers with a failure
    /// status, or sends an undecodable body.
    pub async fn get(&self, id: &str) -> RemoteResult<TemplateRecord> {
        let response = self
            .inner
            .http
            .get(self.templates_url(Some(id))?)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Save a document under `name`; the name doubles as the record id.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Busy`] while another save is in flight, and
    /// other variants if the request fails.
    pub async fn save(&self, name: &str, pages: &[Page]) -> RemoteResult<()> {
        let _guard = InFlight::acquire(&self.inner.saving, "save")?;
        let body = SaveRequest {
            id: name,
            name,
            pages: export_document(pages).map_err(|e| RemoteError::Decode(e.to_string()))?,
        };

        let response = self
            .inner
            .http
            .post(self.templates_url(None)?)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;
        tracing::info!(template = name, pages = pages.len(), "Template saved");
        Ok(())
    }

    /// Delete a stored template.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Busy`] while another delete is in flight, and
    /// other variants if the request fails.
    pub async fn delete(&self, id: &str) -> RemoteResult<()> {
        let _guard = InFlight::acquire(&self.inner.deleting, "delete")?;
        let response = self
            .inner
            .http
            .delete(self.templates_url(Some(id))?)
            .send()
            .await?;
        check_status(response).await?;
        tracing::info!(template = id, "Template deleted");
        Ok(())
    }

    /// Probe whether the store is reachable and answering.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Unavailable`] or
    /// [`RemoteError::OperationFailed`] when it is not.
    pub async fn check(&self) -> RemoteResult<()> {
        let response = self
            .inner
            .http
            .get(self.templates_url(None)?)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        body
    };
    Err(RemoteError::OperationFailed {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_urls_rejected() {
        assert!(matches!(
            TemplateClient::new("not a url"),
            Err(RemoteError::InvalidUrl(_))
        ));
        assert!(matches!(
            TemplateClient::new("ftp://example.com"),
            Err(RemoteError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_templates_url_building() {
        let client = TemplateClient::new("http://localhost:3001/api/").expect("client");
        assert_eq!(
            client.templates_url(None).expect("url").as_str(),
            "http://localhost:3001/api/templates"
        );
        assert_eq!(
            client.templates_url(Some("Q3 report")).expect("url").as_str(),
            "http://localhost:3001/api/templates/Q3%20report"
        );
    }

    #[test]
    fn test_record_without_metadata() {
        let record: TemplateRecord =
            serde_json::from_str(r#"{"id":"invoice","pages":"[{}]"}"#).expect("record");
        assert_eq!(record.display_name(), "invoice");
        assert!(record.created_at.is_none());
        assert_eq!(record.decode_pages().expect("pages").len(), 1);
    }

    #[test]
    fn test_record_with_timestamps() {
        let record: TemplateRecord = serde_json::from_str(
            r#"{"id":"a","name":"Quarterly","createdAt":"2024-01-02T03:04:05Z","updatedAt":"2024-02-01T00:00:00.000Z","pages":"not json"}"#,
        )
        .expect("record");
        assert_eq!(record.display_name(), "Quarterly");
        assert!(record.updated_at > record.created_at);
        assert!(matches!(record.decode_pages(), Err(RemoteError::Decode(_))));
    }

    #[test]
    fn test_in_flight_flag_released() {
        let flag = AtomicBool::new(false);
        let guard = InFlight::acquire(&flag, "save").expect("first");
        assert!(matches!(
            InFlight::acquire(&flag, "save"),
            Err(RemoteError::Busy("save"))
        ));
        drop(guard);
        assert!(InFlight::acquire(&flag, "save").is_ok());
    }
}
