//! Model transport — the data adapter handed to the widget constructor.
//!
//! DESIGN
//! ======
//! The widget pulls project manifests, model metadata, geometry and object
//! info through this trait instead of fetching on its own. The HTTP
//! implementation attaches the session cookie so requests run with the
//! signed-in user's credentials.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::HttpTimeouts;
use crate::error::ViewerError;

/// A project the widget can load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProjectRef {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None }
    }
}

#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// # Errors
    ///
    /// Returns a transport error when the request fails or is rejected.
    async fn projects(&self) -> Result<Vec<ProjectRef>, ViewerError>;

    /// # Errors
    ///
    /// Returns a transport error when the request fails or is rejected.
    async fn project(&self, project_id: &str) -> Result<Value, ViewerError>;

    /// # Errors
    ///
    /// Returns a transport error when the request fails or is rejected.
    async fn metadata(&self, project_id: &str, model_id: &str) -> Result<Value, ViewerError>;

    /// # Errors
    ///
    /// Returns a transport error when the request fails or is rejected.
    async fn geometry(&self, project_id: &str, model_id: &str) -> Result<Vec<u8>, ViewerError>;

    /// # Errors
    ///
    /// Returns a transport error when the request fails or is rejected.
    async fn object_info(&self, project_id: &str, model_id: &str, object_id: &str) -> Result<Value, ViewerError>;
}

// =============================================================================
// HTTP TRANSPORT
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProjectsEnvelope {
    projects: Vec<ProjectRef>,
}

pub struct HttpModelTransport {
    http: reqwest::Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl HttpModelTransport {
    /// # Errors
    ///
    /// Returns [`ViewerError::HttpClientBuild`] if the client cannot be built.
    pub fn new(base_url: &str, session_cookie: Option<String>, timeouts: HttpTimeouts) -> Result<Self, ViewerError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request())
            .connect_timeout(timeouts.connect())
            .build()
            .map_err(|e| ViewerError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), session_cookie })
    }

    #[must_use]
    pub fn projects_url(&self) -> String {
        format!("{}/projects", self.base_url)
    }

    #[must_use]
    pub fn project_url(&self, project_id: &str) -> String {
        format!("{}/projects/{}", self.base_url, urlencoding::encode(project_id))
    }

    /// `leaf` is a fixed resource name; ids are percent-encoded.
    #[must_use]
    pub fn model_url(&self, project_id: &str, model_id: &str, leaf: &str) -> String {
        format!(
            "{}/models/{}/{leaf}",
            self.project_url(project_id),
            urlencoding::encode(model_id)
        )
    }

    #[must_use]
    pub fn object_url(&self, project_id: &str, model_id: &str, object_id: &str) -> String {
        self.model_url(project_id, model_id, &format!("objects/{}", urlencoding::encode(object_id)))
    }

    async fn get(&self, url: String, accept: &str) -> Result<reqwest::Response, ViewerError> {
        debug!(%url, "model transport request");
        let mut request = self.http.get(&url).header(ACCEPT, accept);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(COOKIE, cookie);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ViewerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::TransportRejected { status: status.as_u16(), url });
        }
        Ok(response)
    }

    async fn get_json(&self, url: String) -> Result<Value, ViewerError> {
        self.get(url, "application/json")
            .await?
            .json::<Value>()
            .await
            .map_err(|e| ViewerError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ModelTransport for HttpModelTransport {
    async fn projects(&self) -> Result<Vec<ProjectRef>, ViewerError> {
        let body = self.get_json(self.projects_url()).await?;
        let envelope: ProjectsEnvelope =
            serde_json::from_value(body).map_err(|e| ViewerError::Transport(e.to_string()))?;
        Ok(envelope.projects)
    }

    async fn project(&self, project_id: &str) -> Result<Value, ViewerError> {
        self.get_json(self.project_url(project_id)).await
    }

    async fn metadata(&self, project_id: &str, model_id: &str) -> Result<Value, ViewerError> {
        self.get_json(self.model_url(project_id, model_id, "metadata"))
            .await
    }

    async fn geometry(&self, project_id: &str, model_id: &str) -> Result<Vec<u8>, ViewerError> {
        let bytes = self
            .get(self.model_url(project_id, model_id, "geometry"), "application/octet-stream")
            .await?
            .bytes()
            .await
            .map_err(|e| ViewerError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn object_info(&self, project_id: &str, model_id: &str, object_id: &str) -> Result<Value, ViewerError> {
        self.get_json(self.object_url(project_id, model_id, object_id))
            .await
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
