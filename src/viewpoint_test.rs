use super::*;
use serde_json::json;

fn bitmap() -> Bitmap {
    Bitmap {
        bitmap_type: "png".into(),
        bitmap_data: "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==".into(),
        location: Point { x: 1.0, y: 2.0, z: 3.0 },
        normal: Point { x: 0.0, y: 0.0, z: 1.0 },
        up: Point { x: 0.0, y: 1.0, z: 0.0 },
        height: 2.5,
    }
}

fn captured() -> Viewpoint {
    Viewpoint {
        guid: Some("3b3a4c1e-6f0e-4a63-9a4b-8a3f1d7f2c10".into()),
        perspective_camera: Some(PerspectiveCamera {
            camera_view_point: Point { x: 10.0, y: 10.0, z: 10.0 },
            camera_direction: Point { x: -1.0, y: -1.0, z: -1.0 },
            camera_up_vector: Point { x: 0.0, y: 0.0, z: 1.0 },
            field_of_view: 60.0,
        }),
        bitmaps: Some(vec![bitmap()]),
        components: Some(Components {
            visibility: Visibility {
                default_visibility: true,
                exceptions: vec![],
                view_setup_hints: Some(BcfCreationOptions::all_visible().into()),
            },
            ..Components::default()
        }),
        ..Viewpoint::default()
    }
}

#[test]
fn wire_body_never_contains_bitmaps() {
    let vp = captured();
    assert!(vp.has_bitmaps());

    let body = wire_body(&vp).unwrap();
    let obj = body.as_object().unwrap();
    assert!(!obj.contains_key(BITMAPS_KEY));
    assert!(obj.contains_key("perspective_camera"));
    assert_eq!(body["components"]["visibility"]["view_setup_hints"]["openings_visible"], json!(true));
}

#[test]
fn wire_body_drops_bitmaps_hidden_in_extra_fields() {
    let mut vp = Viewpoint::default();
    vp.extra.insert(BITMAPS_KEY.into(), json!([{"bitmap_type": "png"}]));
    let body = wire_body(&vp).unwrap();
    assert!(body.get(BITMAPS_KEY).is_none());
}

#[test]
fn strip_bitmaps_reports_count_and_clears() {
    let mut vp = captured();
    assert_eq!(vp.strip_bitmaps(), 1);
    assert!(!vp.has_bitmaps());
    assert_eq!(vp.strip_bitmaps(), 0);
}

#[test]
fn unknown_fields_survive_a_pass_through() {
    let raw = json!({
        "guid": "abc",
        "bitmaps": [],
        "components": {
            "visibility": { "default_visibility": false }
        },
        "vendor_extension": { "tool": "xeokit" }
    });
    let vp: Viewpoint = serde_json::from_value(raw).unwrap();
    assert_eq!(vp.extra.get("vendor_extension"), Some(&json!({ "tool": "xeokit" })));
    assert!(!vp.has_bitmaps());

    let body = wire_body(&vp).unwrap();
    assert_eq!(body["vendor_extension"]["tool"], json!("xeokit"));
    assert!(body.get(BITMAPS_KEY).is_none());
}

#[test]
fn creation_options_use_camel_case() {
    let json = serde_json::to_value(BcfCreationOptions::all_visible()).unwrap();
    assert_eq!(json, json!({ "spacesVisible": true, "spaceBoundariesVisible": true, "openingsVisible": true }));
}

#[test]
fn view_setup_hints_follow_options() {
    let vp = captured();
    let hints = vp.view_setup_hints().unwrap();
    assert!(hints.spaces_visible && hints.space_boundaries_visible && hints.openings_visible);
}
