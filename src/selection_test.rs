use super::*;

#[test]
fn notification_text_contains_id_and_type() {
    let event = SelectionEvent::new("E1", "IfcWall");
    let text = event.notification_text();
    assert_eq!(text, "Query result:\n\nObject ID = E1\nIFC type = \"IfcWall\"");
}

#[test]
fn meta_object_type_uses_json_type_key() {
    let event: SelectionEvent = serde_json::from_str(
        r#"{"entity_id":"2O2Fr$t4X7Zf8NOew3FLOH","meta_object":{"id":"2O2Fr$t4X7Zf8NOew3FLOH","type":"IfcDoor","name":"Door 01"}}"#,
    )
    .unwrap();
    assert_eq!(event.meta_object.kind, "IfcDoor");
    assert_eq!(event.meta_object.name.as_deref(), Some("Door 01"));
}

#[test]
fn collecting_notifier_keeps_order() {
    let notifier = CollectingNotifier::new();
    notifier.notify("first");
    notifier.notify("second");
    assert_eq!(notifier.messages(), vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn collecting_notifier_clones_share_messages() {
    let notifier = CollectingNotifier::new();
    let clone = notifier.clone();
    clone.notify("shared");
    assert_eq!(notifier.messages(), vec!["shared".to_string()]);
}
