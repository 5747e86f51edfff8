//! Viewer host — lifecycle of one embedded viewer widget.
//!
//! DESIGN
//! ======
//! `ViewerHost` is a cheap clone over shared state. The state is an explicit
//! machine:
//!
//! ```text
//! Uninitialized -> Loading -> Ready -> Destroyed
//!        |            |
//!        +--> Failed <+
//! ```
//!
//! `create` moves to `Loading`, releases the lock while the viewer module
//! resolves, then re-checks the state. If `destroy` landed in between, the
//! freshly built widget is released on the spot and `create` reports
//! `Destroyed`. A second `create` while `Loading` or `Ready` is rejected.
//!
//! ERROR HANDLING
//! ==============
//! Load, mount and project errors move the host to `Failed` and are returned
//! to the caller. A failed host stays failed; build a new one to retry.
//! `destroy` on a destroyed host fails with `AlreadyDestroyed`.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ErrorCode, ViewerError};
use crate::mount::MountPoints;
use crate::selection::{Notifier, SelectionEvent};
use crate::sync::{PublishPlan, ScheduledPublish, publish_logged};
use crate::transport::{ModelTransport, ProjectRef};
use crate::viewpoint::{BcfCreationOptions, Viewpoint};
use crate::widget::{ReleaseStep, ViewerEvent, ViewerHandle, ViewerLoader};

// =============================================================================
// STATE
// =============================================================================

/// Observable lifecycle phase of a [`ViewerHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    Uninitialized,
    Loading,
    Ready,
    Failed,
    Destroyed,
}

impl fmt::Display for HostPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Destroyed => "destroyed",
        })
    }
}

struct ReadyViewer {
    handle: ViewerHandle,
    scheduled: Option<ScheduledPublish>,
}

enum HostState {
    Uninitialized,
    Loading,
    Ready(ReadyViewer),
    Failed,
    Destroyed,
}

impl HostState {
    fn phase(&self) -> HostPhase {
        match self {
            Self::Uninitialized => HostPhase::Uninitialized,
            Self::Loading => HostPhase::Loading,
            Self::Ready(_) => HostPhase::Ready,
            Self::Failed => HostPhase::Failed,
            Self::Destroyed => HostPhase::Destroyed,
        }
    }
}

// =============================================================================
// HOST
// =============================================================================

#[derive(Clone)]
pub struct ViewerHost {
    state: Arc<Mutex<HostState>>,
    loader: Arc<dyn ViewerLoader>,
    transport: Arc<dyn ModelTransport>,
    notifier: Arc<dyn Notifier>,
    publish_plan: Option<PublishPlan>,
}

impl ViewerHost {
    #[must_use]
    pub fn new(loader: Arc<dyn ViewerLoader>, transport: Arc<dyn ModelTransport>, notifier: Arc<dyn Notifier>) -> Self {
        Self { state: Arc::new(Mutex::new(HostState::Uninitialized)), loader, transport, notifier, publish_plan: None }
    }

    /// Publish a viewpoint once, `plan.delay` after the viewer becomes ready.
    #[must_use]
    pub fn with_publish_plan(mut self, plan: PublishPlan) -> Self {
        self.publish_plan = Some(plan);
        self
    }

    pub async fn phase(&self) -> HostPhase {
        self.state.lock().await.phase()
    }

    /// Load the viewer, bind it to `mounts`, and open the first project.
    ///
    /// # Errors
    ///
    /// - [`ViewerError::AlreadyActive`] while loading or ready
    /// - [`ViewerError::Failed`] / [`ViewerError::Destroyed`] on a spent host
    /// - [`ViewerError::Mount`] / [`ViewerError::NoProject`] on bad input
    /// - [`ViewerError::Load`] when the viewer module cannot be resolved
    /// - [`ViewerError::Destroyed`] if `destroy` ran while loading
    pub async fn create(&self, mounts: &MountPoints, projects: &[ProjectRef]) -> Result<(), ViewerError> {
        let project = {
            let mut state = self.state.lock().await;
            match &*state {
                HostState::Uninitialized => {}
                HostState::Loading | HostState::Ready(_) => {
                    return Err(ViewerError::AlreadyActive { phase: state.phase() });
                }
                HostState::Failed => return Err(ViewerError::Failed),
                HostState::Destroyed => return Err(ViewerError::Destroyed),
            }

            let checked = mounts
                .validate()
                .and_then(|()| projects.first().ok_or(ViewerError::NoProject));
            match checked {
                Ok(project) => {
                    *state = HostState::Loading;
                    project.clone()
                }
                Err(e) => {
                    warn!(code = e.error_code(), error = %e, "viewer create rejected");
                    *state = HostState::Failed;
                    return Err(e);
                }
            }
        };

        info!(project_id = %project.id, "viewer loading");
        let built = self.build(mounts, &project).await;

        let mut state = self.state.lock().await;
        if !matches!(*state, HostState::Loading) {
            if let Ok(handle) = built {
                let steps = handle.release();
                info!(steps = steps.len(), "viewer released after destroy during load");
            }
            return Err(ViewerError::Destroyed);
        }

        match built {
            Ok(handle) => {
                let scheduled = self
                    .publish_plan
                    .clone()
                    .map(|plan| self.schedule_publish(plan));
                *state = HostState::Ready(ReadyViewer { handle, scheduled });
                info!(project_id = %project.id, "viewer ready");
                Ok(())
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "viewer load failed");
                *state = HostState::Failed;
                Err(e)
            }
        }
    }

    async fn build(&self, mounts: &MountPoints, project: &ProjectRef) -> Result<ViewerHandle, ViewerError> {
        let factory = self.loader.load().await?;
        let viewer = factory
            .construct(self.transport.clone(), mounts)
            .map_err(|e| match e {
                ViewerError::Mount { .. } | ViewerError::Load(_) => e,
                other => ViewerError::Load(other.to_string()),
            })?;
        let mut handle = ViewerHandle::new(viewer);

        let notifier = self.notifier.clone();
        handle.subscribe(
            ViewerEvent::QueryPicked,
            Arc::new(move |event: &SelectionEvent| notify_selection(notifier.as_ref(), event)),
        );

        if let Err(e) = handle.load_project(&project.id) {
            handle.release();
            return Err(e);
        }
        Ok(handle)
    }

    fn schedule_publish(&self, plan: PublishPlan) -> ScheduledPublish {
        let state = Arc::downgrade(&self.state);
        info!(delay_secs = plan.delay.as_secs(), topic_id = %plan.topic.topic_id, "viewpoint publish scheduled");
        ScheduledPublish::spawn(plan.delay, async move {
            let Some(state) = state.upgrade() else {
                return;
            };
            let captured = match &*state.lock().await {
                HostState::Ready(ready) => ready.handle.save_bcf_viewpoint(plan.options),
                other => {
                    debug!(phase = %other.phase(), "scheduled publish skipped");
                    return;
                }
            };
            match captured {
                Ok(mut viewpoint) => {
                    viewpoint.strip_bitmaps();
                    publish_logged(plan.publisher.as_ref(), &viewpoint, &plan.topic).await;
                }
                Err(e) => warn!(error = %e, "scheduled viewpoint capture failed"),
            }
        })
    }

    /// Show the user what was picked.
    pub fn on_selection(&self, event: &SelectionEvent) {
        notify_selection(self.notifier.as_ref(), event);
    }

    /// Snapshot the current scene.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::NotInitialized`] before `create` completes,
    /// [`ViewerError::Destroyed`] after `destroy`, or the widget's own error.
    pub async fn capture_viewpoint(&self, options: BcfCreationOptions) -> Result<Viewpoint, ViewerError> {
        match &*self.state.lock().await {
            HostState::Ready(ready) => ready.handle.save_bcf_viewpoint(options),
            HostState::Destroyed => Err(ViewerError::Destroyed),
            _ => Err(ViewerError::NotInitialized),
        }
    }

    /// Tear the viewer down and return the release steps performed.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::AlreadyDestroyed`] on a second call.
    pub async fn destroy(&self) -> Result<Vec<ReleaseStep>, ViewerError> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, HostState::Destroyed) {
            HostState::Uninitialized => {
                *state = HostState::Uninitialized;
                debug!("destroy without a viewer is a no-op");
                Ok(Vec::new())
            }
            HostState::Loading => {
                info!("viewer destroyed while loading");
                Ok(Vec::new())
            }
            HostState::Ready(ReadyViewer { handle, scheduled }) => {
                if let Some(scheduled) = scheduled {
                    scheduled.cancel();
                }
                let steps = handle.release();
                info!(steps = steps.len(), "viewer destroyed");
                Ok(steps)
            }
            HostState::Failed => Ok(Vec::new()),
            HostState::Destroyed => Err(ViewerError::AlreadyDestroyed),
        }
    }
}

fn notify_selection(notifier: &dyn Notifier, event: &SelectionEvent) {
    info!(entity_id = %event.entity_id, ifc_type = %event.meta_object.kind, "query picked");
    notifier.notify(&event.notification_text());
}

#[cfg(test)]
#[path = "host_test.rs"]
mod tests;
