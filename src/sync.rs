//! Viewpoint sync — publish captured viewpoints to a BCF topic.
//!
//! DESIGN
//! ======
//! Publishing goes through [`ViewpointPublisher`] so the host can be driven
//! against a recording double. The HTTP publisher posts the wire body (never
//! bitmaps) to `/api/bcf/2.1/projects/{project}/topics/{topic}/viewpoints`
//! with the session cookie attached.
//!
//! A scheduled publish is a one-shot task owned by the host. It captures the
//! viewpoint when it fires, not when it is scheduled, and is aborted when the
//! host is destroyed.
//!
//! ERROR HANDLING
//! ==============
//! [`publish_logged`] logs and swallows failures. No retry or back-off:
//! a lost viewpoint is only reported in the log.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{HttpTimeouts, ViewerConfig};
use crate::error::{ErrorCode, ViewerError};
use crate::viewpoint::{BcfCreationOptions, Viewpoint, wire_body};

// =============================================================================
// TOPIC
// =============================================================================

/// The BCF project/topic pair a viewpoint belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRef {
    pub project_id: String,
    pub topic_id: Uuid,
}

impl TopicRef {
    #[must_use]
    pub fn new(project_id: impl Into<String>, topic_id: Uuid) -> Self {
        Self { project_id: project_id.into(), topic_id }
    }

    /// Path of the topic's viewpoints collection. The project id is
    /// percent-encoded so it always stays a single path segment.
    #[must_use]
    pub fn viewpoints_path(&self) -> String {
        format!(
            "/api/bcf/2.1/projects/{}/topics/{}/viewpoints",
            urlencoding::encode(&self.project_id),
            self.topic_id
        )
    }
}

// =============================================================================
// PUBLISHER
// =============================================================================

#[async_trait]
pub trait ViewpointPublisher: Send + Sync {
    /// Send `viewpoint` to `topic` and return the endpoint's JSON response.
    ///
    /// # Errors
    ///
    /// Returns a publish error when the request fails or is rejected.
    async fn publish(&self, viewpoint: &Viewpoint, topic: &TopicRef) -> Result<Value, ViewerError>;
}

pub struct HttpViewpointPublisher {
    http: reqwest::Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl HttpViewpointPublisher {
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

    /// # Errors
    ///
    /// Returns [`ViewerError::HttpClientBuild`] if the client cannot be built.
    pub fn from_config(config: &ViewerConfig) -> Result<Self, ViewerError> {
        Self::new(&config.bcf_base_url, config.session_cookie.clone(), config.timeouts)
    }

    #[must_use]
    pub fn endpoint(&self, topic: &TopicRef) -> String {
        format!("{}{}", self.base_url, topic.viewpoints_path())
    }
}

#[async_trait]
impl ViewpointPublisher for HttpViewpointPublisher {
    async fn publish(&self, viewpoint: &Viewpoint, topic: &TopicRef) -> Result<Value, ViewerError> {
        let body = wire_body(viewpoint)?;

        let mut request = self
            .http
            .post(self.endpoint(topic))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&body);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ViewerError::Publish(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ViewerError::Publish(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(ViewerError::PublishRejected { status, body: text });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ViewerError::Publish(format!("invalid response JSON: {e}")))
    }
}

/// Publish and log the outcome. Failures are swallowed.
pub async fn publish_logged(publisher: &dyn ViewpointPublisher, viewpoint: &Viewpoint, topic: &TopicRef) -> Option<Value> {
    match publisher.publish(viewpoint, topic).await {
        Ok(response) => {
            info!(project_id = %topic.project_id, topic_id = %topic.topic_id, "viewpoint published");
            Some(response)
        }
        Err(e) => {
            warn!(
                project_id = %topic.project_id,
                topic_id = %topic.topic_id,
                code = e.error_code(),
                retryable = e.retryable(),
                error = %e,
                "viewpoint publish failed"
            );
            None
        }
    }
}

// =============================================================================
// SCHEDULING
// =============================================================================

/// What a host publishes once its viewer is ready, and when.
#[derive(Clone)]
pub struct PublishPlan {
    pub publisher: Arc<dyn ViewpointPublisher>,
    pub topic: TopicRef,
    pub delay: Duration,
    pub options: BcfCreationOptions,
}

impl PublishPlan {
    #[must_use]
    pub fn new(publisher: Arc<dyn ViewpointPublisher>, topic: TopicRef, delay: Duration) -> Self {
        Self { publisher, topic, delay, options: BcfCreationOptions::all_visible() }
    }
}

/// A pending one-shot publish. Abort with [`ScheduledPublish::cancel`].
#[derive(Debug)]
pub struct ScheduledPublish {
    task: JoinHandle<()>,
}

impl ScheduledPublish {
    /// Run `job` after `delay` on the current runtime.
    pub fn spawn<F>(delay: Duration, job: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
        });
        Self { task }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
