use super::*;

fn valid_mounts() -> MountPoints {
    MountPoints {
        canvas: MountPoint::attached("ifc-canvas"),
        explorer: MountPoint::attached("ifc-explorer"),
        toolbar: MountPoint::attached("ifc-toolbar"),
        nav_cube_canvas: MountPoint::attached("ifc-nav-cube"),
        section_planes_overview_canvas: MountPoint::attached("ifc-section-planes"),
    }
}

#[test]
fn valid_set_passes() {
    assert!(valid_mounts().validate().is_ok());
}

#[test]
fn blank_id_is_rejected_with_region() {
    let mut mounts = valid_mounts();
    mounts.explorer = MountPoint::attached("   ");
    let err = mounts.validate().unwrap_err();
    assert!(matches!(err, ViewerError::Mount { region: MountRegion::Explorer, .. }));
}

#[test]
fn detached_element_is_rejected() {
    let mut mounts = valid_mounts();
    mounts.section_planes_overview_canvas = MountPoint::detached("ifc-section-planes");
    let err = mounts.validate().unwrap_err();
    assert!(matches!(err, ViewerError::Mount { region: MountRegion::SectionPlanesOverviewCanvas, .. }));
}

#[test]
fn duplicate_ids_are_rejected_on_second_use() {
    let mut mounts = valid_mounts();
    mounts.toolbar = MountPoint::attached("ifc-canvas");
    let err = mounts.validate().unwrap_err();
    assert!(matches!(err, ViewerError::Mount { region: MountRegion::Toolbar, .. }));
}

#[test]
fn get_maps_each_region() {
    let mounts = valid_mounts();
    let ids: Vec<&str> = MountRegion::ALL
        .iter()
        .map(|r| mounts.get(*r).element_id.as_str())
        .collect();
    assert_eq!(ids, ["ifc-canvas", "ifc-explorer", "ifc-toolbar", "ifc-nav-cube", "ifc-section-planes"]);
}

#[test]
fn region_serializes_snake_case() {
    let json = serde_json::to_string(&MountRegion::NavCubeCanvas).unwrap();
    assert_eq!(json, "\"nav_cube_canvas\"");
}
