use super::test_helpers::{FakeViewer, WidgetLog};
use super::*;
use crate::viewpoint::BcfCreationOptions;
use std::collections::VecDeque;
use std::sync::Mutex;

fn handle_with(log: &Arc<WidgetLog>, plugins: &[&str]) -> ViewerHandle {
    ViewerHandle::new(Box::new(FakeViewer::new(log.clone(), plugins)))
}

#[test]
fn release_follows_fixed_order() {
    let log = Arc::new(WidgetLog::default());
    let handle = handle_with(&log, &["nav_cube", "section_planes", "tree_view"]);

    let steps = handle.release();

    assert_eq!(
        steps,
        vec![
            ReleaseStep::ViewpointsPlugin,
            ReleaseStep::CanvasContextMenu,
            ReleaseStep::ObjectContextMenu,
            ReleaseStep::Plugin("nav_cube".into()),
            ReleaseStep::Plugin("section_planes".into()),
            ReleaseStep::Plugin("tree_view".into()),
            ReleaseStep::Scene,
        ]
    );
    assert_eq!(
        log.releases(),
        vec![
            "bcf_viewpoints_plugin",
            "canvas_context_menu",
            "object_context_menu",
            "plugin:nav_cube",
            "plugin:section_planes",
            "plugin:tree_view",
            "scene",
        ]
    );
}

#[test]
fn release_without_plugins_still_destroys_scene() {
    let log = Arc::new(WidgetLog::default());
    let steps = handle_with(&log, &[]).release();
    assert_eq!(steps.last(), Some(&ReleaseStep::Scene));
    assert_eq!(steps.len(), 4);
}

#[test]
fn release_unregisters_every_handler() {
    let log = Arc::new(WidgetLog::default());
    let mut handle = handle_with(&log, &[]);
    handle.subscribe(ViewerEvent::QueryPicked, Arc::new(|_| {}));
    handle.subscribe(ViewerEvent::QueryPicked, Arc::new(|_| {}));
    assert_eq!(handle.subscription_count(), 2);
    assert_eq!(log.live_handlers(), 2);

    handle.release();
    assert_eq!(log.live_handlers(), 0);
}

#[test]
fn dropping_a_live_handle_releases_once() {
    let log = Arc::new(WidgetLog::default());
    {
        let _handle = handle_with(&log, &["measurements"]);
    }
    assert_eq!(log.releases().iter().filter(|s| *s == "scene").count(), 1);
    assert_eq!(log.releases().len(), 5);
}

#[test]
fn handle_forwards_commands() {
    let log = Arc::new(WidgetLog::default());
    let mut handle = handle_with(&log, &[]);
    handle.load_project("demo-project").unwrap();
    let vp = handle
        .save_bcf_viewpoint(BcfCreationOptions::all_visible())
        .unwrap();
    assert!(vp.has_bitmaps());
    assert_eq!(log.loaded_projects.lock().unwrap().as_slice(), ["demo-project"]);
    assert_eq!(log.captures(), 1);
    handle.release();
}

#[test]
fn release_step_display_names() {
    assert_eq!(ReleaseStep::Plugin("nav_cube".into()).to_string(), "plugin:nav_cube");
    assert_eq!(ReleaseStep::Scene.to_string(), "scene");
    assert_eq!(ViewerEvent::QueryPicked.as_str(), "queryPicked");
}

// =============================================================================
// plugins that deregister during teardown
// =============================================================================

type PluginList = Arc<Mutex<VecDeque<Box<dyn Plugin>>>>;

enum OnDestroy {
    Nothing,
    DeregisterSelf,
    DestroySibling(&'static str),
}

/// A plugin that edits the viewer's shared plugin list while being destroyed.
struct RegisteredPlugin {
    id: &'static str,
    list: PluginList,
    log: Arc<WidgetLog>,
    on_destroy: OnDestroy,
}

impl Plugin for RegisteredPlugin {
    fn id(&self) -> &str {
        self.id
    }

    fn destroy(self: Box<Self>) {
        match self.on_destroy {
            OnDestroy::Nothing => {}
            OnDestroy::DeregisterSelf => self.list.lock().unwrap().retain(|p| p.id() != self.id),
            OnDestroy::DestroySibling(sibling) => {
                let removed = {
                    let mut list = self.list.lock().unwrap();
                    list.iter()
                        .position(|p| p.id() == sibling)
                        .and_then(|i| list.remove(i))
                };
                if let Some(plugin) = removed {
                    plugin.destroy();
                }
            }
        }
        self.log.releases.lock().unwrap().push(format!("plugin:{}", self.id));
    }
}

struct SharedListViewer {
    log: Arc<WidgetLog>,
    plugins: PluginList,
}

impl SharedListViewer {
    fn record(&self, step: &str) {
        self.log.releases.lock().unwrap().push(step.to_string());
    }
}

impl Viewer for SharedListViewer {
    fn on(&mut self, _event: ViewerEvent, _handler: SelectionHandler) -> HandlerId {
        0
    }

    fn off(&mut self, _id: HandlerId) {}

    fn load_project(&mut self, _project_id: &str) -> Result<(), ViewerError> {
        Ok(())
    }

    fn save_bcf_viewpoint(&self, options: BcfCreationOptions) -> Result<Viewpoint, ViewerError> {
        Ok(super::test_helpers::sample_viewpoint(options))
    }

    fn destroy_bcf_viewpoints_plugin(&mut self) {
        self.record("bcf_viewpoints_plugin");
    }

    fn destroy_canvas_context_menu(&mut self) {
        self.record("canvas_context_menu");
    }

    fn destroy_object_context_menu(&mut self) {
        self.record("object_context_menu");
    }

    fn take_first_plugin(&mut self) -> Option<Box<dyn Plugin>> {
        self.plugins.lock().unwrap().pop_front()
    }

    fn destroy_scene(&mut self) {
        self.record("scene");
    }
}

#[test]
fn drain_tolerates_plugins_that_deregister_themselves_or_siblings() {
    let log = Arc::new(WidgetLog::default());
    let list: PluginList = Arc::new(Mutex::new(VecDeque::new()));
    for (id, on_destroy) in [
        ("tree_view", OnDestroy::DeregisterSelf),
        ("section_planes", OnDestroy::DestroySibling("section_planes_overview")),
        ("section_planes_overview", OnDestroy::Nothing),
        ("nav_cube", OnDestroy::Nothing),
    ] {
        let plugin = RegisteredPlugin { id, list: list.clone(), log: log.clone(), on_destroy };
        list.lock().unwrap().push_back(Box::new(plugin));
    }
    let handle = ViewerHandle::new(Box::new(SharedListViewer { log: log.clone(), plugins: list.clone() }));

    let steps = handle.release();

    assert_eq!(
        steps,
        vec![
            ReleaseStep::ViewpointsPlugin,
            ReleaseStep::CanvasContextMenu,
            ReleaseStep::ObjectContextMenu,
            ReleaseStep::Plugin("tree_view".into()),
            ReleaseStep::Plugin("section_planes".into()),
            ReleaseStep::Plugin("nav_cube".into()),
            ReleaseStep::Scene,
        ]
    );

    let releases = log.releases();
    for id in ["tree_view", "section_planes", "section_planes_overview", "nav_cube"] {
        let entry = format!("plugin:{id}");
        assert_eq!(releases.iter().filter(|r| **r == entry).count(), 1, "{id} destroyed once");
    }
    assert_eq!(releases.last().map(String::as_str), Some("scene"));
    assert!(list.lock().unwrap().is_empty());
}
