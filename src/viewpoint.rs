//! BCF 2.1 viewpoint model.
//!
//! DESIGN
//! ======
//! Field names follow the BCF REST API JSON (snake_case). Fields this crate
//! does not interpret are kept in `extra` so a viewpoint captured from the
//! widget reaches the endpoint intact, minus bitmaps.
//!
//! Bitmaps carry base64 image payloads that can run to megabytes. They are
//! never sent: [`wire_body`] removes the key from the serialized object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ViewerError;

/// JSON key removed from every outgoing viewpoint body.
pub const BITMAPS_KEY: &str = "bitmaps";

// =============================================================================
// CAPTURE OPTIONS
// =============================================================================

/// Visibility hints passed to the widget when capturing a viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BcfCreationOptions {
    pub spaces_visible: bool,
    pub space_boundaries_visible: bool,
    pub openings_visible: bool,
}

impl BcfCreationOptions {
    #[must_use]
    pub fn all_visible() -> Self {
        Self { spaces_visible: true, space_boundaries_visible: true, openings_visible: true }
    }
}

// =============================================================================
// GEOMETRY PRIMITIVES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrthogonalCamera {
    pub camera_view_point: Point,
    pub camera_direction: Point,
    pub camera_up_vector: Point,
    pub view_to_world_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    pub camera_view_point: Point,
    pub camera_direction: Point,
    pub camera_up_vector: Point,
    pub field_of_view: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start_point: Point,
    pub end_point: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClippingPlane {
    pub location: Point,
    pub direction: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bitmap {
    pub bitmap_type: String,
    pub bitmap_data: String,
    pub location: Point,
    pub normal: Point,
    pub up: Point,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_type: String,
    pub snapshot_data: String,
}

// =============================================================================
// COMPONENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifc_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originating_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authoring_tool_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coloring {
    pub color: String,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewSetupHints {
    pub spaces_visible: bool,
    pub space_boundaries_visible: bool,
    pub openings_visible: bool,
}

impl From<BcfCreationOptions> for ViewSetupHints {
    fn from(options: BcfCreationOptions) -> Self {
        Self {
            spaces_visible: options.spaces_visible,
            space_boundaries_visible: options.space_boundaries_visible,
            openings_visible: options.openings_visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Visibility {
    pub default_visibility: bool,
    #[serde(default)]
    pub exceptions: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_setup_hints: Option<ViewSetupHints>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub selection: Vec<Component>,
    #[serde(default)]
    pub coloring: Vec<Coloring>,
    pub visibility: Visibility,
}

// =============================================================================
// VIEWPOINT
// =============================================================================

/// A camera, visibility and annotation snapshot of the model scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orthogonal_camera: Option<OrthogonalCamera>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspective_camera: Option<PerspectiveCamera>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Line>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clipping_planes: Vec<ClippingPlane>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitmaps: Option<Vec<Bitmap>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    /// Fields passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Viewpoint {
    /// Drop bitmap payloads, returning how many were removed.
    pub fn strip_bitmaps(&mut self) -> usize {
        self.bitmaps.take().map_or(0, |b| b.len())
    }

    #[must_use]
    pub fn has_bitmaps(&self) -> bool {
        self.bitmaps.as_ref().is_some_and(|b| !b.is_empty())
    }

    #[must_use]
    pub fn view_setup_hints(&self) -> Option<ViewSetupHints> {
        self.components
            .as_ref()
            .and_then(|c| c.visibility.view_setup_hints)
    }
}

/// Serialize a viewpoint into the JSON body sent to the BCF endpoint.
///
/// The `bitmaps` key is removed from the serialized object itself, so a
/// bitmap smuggled in through `extra` is dropped too.
///
/// # Errors
///
/// Returns [`ViewerError::Serialize`] if serialization fails.
pub fn wire_body(viewpoint: &Viewpoint) -> Result<Value, ViewerError> {
    let mut body = serde_json::to_value(viewpoint)?;
    if let Value::Object(map) = &mut body {
        map.remove(BITMAPS_KEY);
    }
    Ok(body)
}

#[cfg(test)]
#[path = "viewpoint_test.rs"]
mod tests;
