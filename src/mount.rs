//! Mount points — the named page regions a viewer widget binds to.
//!
//! DESIGN
//! ======
//! The caller owns the regions; the host only reads them. Every region must
//! be present, attached, and distinct before `create` hands them to the
//! widget factory.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// One of the five regions the viewer widget renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountRegion {
    Canvas,
    Explorer,
    Toolbar,
    NavCubeCanvas,
    SectionPlanesOverviewCanvas,
}

impl MountRegion {
    pub const ALL: [Self; 5] =
        [Self::Canvas, Self::Explorer, Self::Toolbar, Self::NavCubeCanvas, Self::SectionPlanesOverviewCanvas];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Canvas => "canvas",
            Self::Explorer => "explorer",
            Self::Toolbar => "toolbar",
            Self::NavCubeCanvas => "nav_cube_canvas",
            Self::SectionPlanesOverviewCanvas => "section_planes_overview_canvas",
        }
    }
}

impl fmt::Display for MountRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page element the widget can attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountPoint {
    pub element_id: String,
    pub attached: bool,
}

impl MountPoint {
    #[must_use]
    pub fn attached(element_id: impl Into<String>) -> Self {
        Self { element_id: element_id.into(), attached: true }
    }

    #[must_use]
    pub fn detached(element_id: impl Into<String>) -> Self {
        Self { element_id: element_id.into(), attached: false }
    }
}

/// The full set of regions supplied to [`crate::host::ViewerHost::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountPoints {
    pub canvas: MountPoint,
    pub explorer: MountPoint,
    pub toolbar: MountPoint,
    pub nav_cube_canvas: MountPoint,
    pub section_planes_overview_canvas: MountPoint,
}

impl MountPoints {
    #[must_use]
    pub fn get(&self, region: MountRegion) -> &MountPoint {
        match region {
            MountRegion::Canvas => &self.canvas,
            MountRegion::Explorer => &self.explorer,
            MountRegion::Toolbar => &self.toolbar,
            MountRegion::NavCubeCanvas => &self.nav_cube_canvas,
            MountRegion::SectionPlanesOverviewCanvas => &self.section_planes_overview_canvas,
        }
    }

    /// Check every region in declaration order and report the first problem.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Mount`] naming the offending region when an
    /// element id is blank, the element is detached, or two regions share an id.
    pub fn validate(&self) -> Result<(), ViewerError> {
        let mut seen = HashSet::new();
        for region in MountRegion::ALL {
            let point = self.get(region);
            let id = point.element_id.trim();
            if id.is_empty() {
                return Err(ViewerError::Mount { region, reason: "element id is empty".into() });
            }
            if !point.attached {
                return Err(ViewerError::Mount { region, reason: format!("element `{id}` is not attached") });
            }
            if !seen.insert(id) {
                return Err(ViewerError::Mount { region, reason: format!("element `{id}` already used by another region") });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "mount_test.rs"]
mod tests;
