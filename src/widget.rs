//! Viewer capability — the seams between the host and the embedded widget.
//!
//! DESIGN
//! ======
//! The widget is an external collaborator reached only through these traits.
//! [`ViewerLoader`] resolves the capability asynchronously (module load),
//! [`ViewerFactory`] binds a widget to mount points, and [`Viewer`] is the
//! command/teardown surface of a live widget.
//!
//! [`ViewerHandle`] owns a live widget exclusively. `release` consumes it, so
//! no command can reach a widget after teardown. Teardown order is fixed:
//! viewpoints plugin, canvas context menu, object context menu, every
//! remaining plugin (pop-front until none remain), then the scene.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ViewerError;
use crate::mount::MountPoints;
use crate::selection::SelectionEvent;
use crate::transport::ModelTransport;
use crate::viewpoint::{BcfCreationOptions, Viewpoint};

// =============================================================================
// EVENTS
// =============================================================================

/// Widget-assigned handle for a registered event handler.
pub type HandlerId = u64;

/// Callback invoked by the widget on every pick.
pub type SelectionHandler = Arc<dyn Fn(&SelectionEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerEvent {
    QueryPicked,
}

impl ViewerEvent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QueryPicked => "queryPicked",
        }
    }
}

// =============================================================================
// CAPABILITY TRAITS
// =============================================================================

/// Asynchronously resolves the viewer module.
#[async_trait]
pub trait ViewerLoader: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ViewerError::Load`] when the module cannot be resolved.
    async fn load(&self) -> Result<Arc<dyn ViewerFactory>, ViewerError>;
}

/// Constructs widgets from a resolved viewer module.
pub trait ViewerFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the widget cannot bind to the mount points.
    fn construct(&self, transport: Arc<dyn ModelTransport>, mounts: &MountPoints) -> Result<Box<dyn Viewer>, ViewerError>;
}

/// A plugin registered on the widget's scene viewer.
pub trait Plugin: Send {
    fn id(&self) -> &str;

    fn destroy(self: Box<Self>);
}

/// Command and teardown surface of a live widget.
pub trait Viewer: Send {
    fn on(&mut self, event: ViewerEvent, handler: SelectionHandler) -> HandlerId;

    fn off(&mut self, id: HandlerId);

    /// # Errors
    ///
    /// Returns [`ViewerError::Widget`] if the widget rejects the project.
    fn load_project(&mut self, project_id: &str) -> Result<(), ViewerError>;

    /// # Errors
    ///
    /// Returns [`ViewerError::Widget`] if the widget cannot snapshot its state.
    fn save_bcf_viewpoint(&self, options: BcfCreationOptions) -> Result<Viewpoint, ViewerError>;

    fn destroy_bcf_viewpoints_plugin(&mut self);

    fn destroy_canvas_context_menu(&mut self);

    fn destroy_object_context_menu(&mut self);

    /// Detach and return the first registered plugin. Must shrink the list.
    fn take_first_plugin(&mut self) -> Option<Box<dyn Plugin>>;

    fn destroy_scene(&mut self);
}

// =============================================================================
// HANDLE
// =============================================================================

/// One step of widget teardown, in the order performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseStep {
    ViewpointsPlugin,
    CanvasContextMenu,
    ObjectContextMenu,
    Plugin(String),
    Scene,
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ViewpointsPlugin => f.write_str("bcf_viewpoints_plugin"),
            Self::CanvasContextMenu => f.write_str("canvas_context_menu"),
            Self::ObjectContextMenu => f.write_str("object_context_menu"),
            Self::Plugin(id) => write!(f, "plugin:{id}"),
            Self::Scene => f.write_str("scene"),
        }
    }
}

/// Exclusive owner of a live widget and its event subscriptions.
pub struct ViewerHandle {
    viewer: Option<Box<dyn Viewer>>,
    subscriptions: Vec<HandlerId>,
}

impl ViewerHandle {
    #[must_use]
    pub fn new(viewer: Box<dyn Viewer>) -> Self {
        Self { viewer: Some(viewer), subscriptions: Vec::new() }
    }

    pub fn subscribe(&mut self, event: ViewerEvent, handler: SelectionHandler) {
        if let Some(viewer) = self.viewer.as_mut() {
            let id = viewer.on(event, handler);
            debug!(event = event.as_str(), handler_id = id, "viewer handler registered");
            self.subscriptions.push(id);
        }
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// # Errors
    ///
    /// Propagates the widget's rejection.
    pub fn load_project(&mut self, project_id: &str) -> Result<(), ViewerError> {
        match self.viewer.as_mut() {
            Some(viewer) => viewer.load_project(project_id),
            None => Err(ViewerError::Destroyed),
        }
    }

    /// # Errors
    ///
    /// Propagates the widget's failure to snapshot.
    pub fn save_bcf_viewpoint(&self, options: BcfCreationOptions) -> Result<Viewpoint, ViewerError> {
        match self.viewer.as_ref() {
            Some(viewer) => viewer.save_bcf_viewpoint(options),
            None => Err(ViewerError::Destroyed),
        }
    }

    /// Unregister handlers and tear the widget down. Returns the steps taken.
    pub fn release(mut self) -> Vec<ReleaseStep> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Vec<ReleaseStep> {
        let Some(mut viewer) = self.viewer.take() else {
            return Vec::new();
        };

        for id in self.subscriptions.drain(..) {
            viewer.off(id);
        }

        let mut steps = Vec::new();
        viewer.destroy_bcf_viewpoints_plugin();
        steps.push(ReleaseStep::ViewpointsPlugin);
        viewer.destroy_canvas_context_menu();
        steps.push(ReleaseStep::CanvasContextMenu);
        viewer.destroy_object_context_menu();
        steps.push(ReleaseStep::ObjectContextMenu);

        // Pop-front: a plugin that deregisters others while being destroyed
        // cannot cause a skip.
        while let Some(plugin) = viewer.take_first_plugin() {
            let id = plugin.id().to_string();
            plugin.destroy();
            steps.push(ReleaseStep::Plugin(id));
        }

        viewer.destroy_scene();
        steps.push(ReleaseStep::Scene);

        for step in &steps {
            debug!(%step, "viewer resource released");
        }
        steps
    }
}

impl Drop for ViewerHandle {
    fn drop(&mut self) {
        if self.viewer.is_some() {
            warn!("viewer handle dropped without destroy; releasing now");
            self.release_inner();
        }
    }
}

impl fmt::Debug for ViewerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerHandle")
            .field("live", &self.viewer.is_some())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "widget_test.rs"]
mod tests;
