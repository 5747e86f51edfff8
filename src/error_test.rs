use super::*;

#[test]
fn error_codes_are_stable() {
    assert_eq!(ViewerError::Load("x".into()).error_code(), "E_VIEWER_LOAD");
    assert_eq!(ViewerError::NotInitialized.error_code(), "E_VIEWER_NOT_INITIALIZED");
    assert_eq!(ViewerError::AlreadyDestroyed.error_code(), "E_VIEWER_ALREADY_DESTROYED");
    assert_eq!(
        ViewerError::Mount { region: MountRegion::Toolbar, reason: "detached".into() }.error_code(),
        "E_VIEWER_MOUNT"
    );
}

#[test]
fn publish_failures_are_retryable_only_for_transient_statuses() {
    assert!(ViewerError::Publish("connection reset".into()).retryable());
    assert!(ViewerError::PublishRejected { status: 503, body: String::new() }.retryable());
    assert!(ViewerError::PublishRejected { status: 429, body: String::new() }.retryable());
    assert!(!ViewerError::PublishRejected { status: 422, body: String::new() }.retryable());
    assert!(!ViewerError::Load("missing".into()).retryable());
}

#[test]
fn already_active_reports_phase() {
    let err = ViewerError::AlreadyActive { phase: HostPhase::Ready };
    assert_eq!(err.to_string(), "viewer already active (phase: ready)");
}

#[test]
fn mount_error_names_region() {
    let err = ViewerError::Mount { region: MountRegion::NavCubeCanvas, reason: "element id is empty".into() };
    assert_eq!(err.to_string(), "invalid mount point nav_cube_canvas: element id is empty");
}
