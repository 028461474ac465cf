//! End-to-end behavior: server renders, client reads and patches.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};
use turbo_flight::prelude::*;
use turbo_flight::{diff, paths_are_disjoint, ActionResponse};
use turbo_router::DynamicParamKind;

type LoaderFn = fn(&SegmentPath, &RouterStateTree, RenderMode) -> anyhow::Result<RenderedSlice>;

fn echo(path: &SegmentPath, node: &RouterStateTree, _: RenderMode) -> anyhow::Result<RenderedSlice> {
    Ok(RenderedSlice::new(json!({"segment": node.segment.to_string(), "depth": path.depth()})))
}

fn renderer(build: &str) -> FlightRenderer<LoaderFn> {
    FlightRenderer::new(RenderOptions::new(build), echo as LoaderFn)
}

fn dashboard(settings_url: Option<&str>) -> RouterStateTree {
    let mut settings = RouterStateTree::new("settings");
    settings.url = settings_url.map(str::to_string);
    RouterStateTree::new("dashboard")
        .with_slot("children", settings)
        .with_slot("analytics", RouterStateTree::new("chart"))
        .root_layout()
}

#[test]
fn scenario_a_patch_replaces_only_target_slot() {
    let base = Arc::new(dashboard(None));
    let raw = json!([
        "dashboard", "children",
        "settings", ["settings", {}, null, null],
        {"html": "<form>updated</form>"}, null
    ]);
    let data_path = DataPath::decode(&raw).unwrap();
    let applied = apply_patch(&base, &data_path).unwrap();

    assert_eq!(applied.tree.slot("children").unwrap().segment, Segment::new("settings"));
    assert!(Arc::ptr_eq(
        applied.tree.slot("analytics").unwrap(),
        base.slot("analytics").unwrap()
    ));
    assert_eq!(applied.content.current, Some(json!({"html": "<form>updated</form>"})));
    assert!(applied.content.head.is_none());
}

#[test]
fn scenario_c_redirect_string_is_not_walked() {
    let base = Arc::new(dashboard(None));
    let reader = ResponseReader::new("b1");
    let navigation = reader
        .navigate(&base, &json!(["b1", "/login"]), EnvelopeContext::Navigation)
        .unwrap()
        .unwrap();
    assert!(matches!(navigation, Navigation::Redirect(ref url) if url == "/login"));
}

#[test]
fn scenario_d_action_without_navigation() {
    let envelope = parse_envelope(&json!([{"pending": true}, ["build123", null]]), EnvelopeContext::Action).unwrap();
    let Envelope::Action(ActionResponse::Result { action_result, build_id, flight_data }) = envelope else {
        panic!("expected action result form");
    };
    assert_eq!(action_result.0, json!({"pending": true}));
    assert_eq!(build_id.as_str(), "build123");
    assert!(flight_data.is_none());
}

#[test]
fn navigation_round_trip_through_wire() {
    let before = RouterStateTree::new("")
        .with_slot(
            "children",
            RouterStateTree::new("products")
                .with_slot("children", RouterStateTree::new(Segment::dynamic("id", "1"))),
        )
        .with_slot("modal", RouterStateTree::new("__DEFAULT__"))
        .root_layout();
    let mut after = before.clone();
    let products = Arc::make_mut(after.parallel_routes.get_mut("children").unwrap());
    products.parallel_routes.insert(
        "children".to_string(),
        Arc::new(RouterStateTree::new(Segment::dynamic("id", "2"))),
    );

    let response = renderer("b7").render_navigation(Some(&before), &after, RenderMode::Full).unwrap();
    let text = serde_json::to_string(&response.encode()).unwrap();

    let reader = ResponseReader::new("b7");
    let base = Arc::new(before);
    let raw: Value = serde_json::from_str(&text).unwrap();
    let Navigation::Patched { tree, contents } = reader
        .navigate(&base, &raw, EnvelopeContext::Navigation)
        .unwrap()
        .unwrap()
    else {
        panic!("expected patched tree");
    };

    assert_eq!(*tree, after);
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].current, Some(json!({"segment": "[id=2:d]", "depth": 2})));
    assert!(Arc::ptr_eq(tree.slot("modal").unwrap(), base.slot("modal").unwrap()));
}

#[test]
fn stale_client_falls_back_to_full_render() {
    // The client is on a different page than the server believes.
    let server_prev = dashboard(None);
    let client = Arc::new(RouterStateTree::new("account").root_layout());
    let next = dashboard(Some("/dashboard/settings"));

    let paths = renderer("b1").render_paths(Some(&server_prev), &next, RenderMode::Full).unwrap();
    let err = apply_flight_data(&client, &FlightData::Paths(paths)).unwrap_err();
    assert!(err.is_recoverable());

    let full = renderer("b1").render_full(&next, RenderMode::Full).unwrap();
    let applied = apply_patch(&client, &full).unwrap();
    assert_eq!(*applied.tree, next);
}

#[test]
fn stale_build_requires_reload() {
    let response = renderer("old").render_redirect("/");
    let err = ResponseReader::new("new")
        .read(&response.encode(), EnvelopeContext::Navigation)
        .unwrap_err();
    assert!(err.requires_reload());
    assert!(!err.is_recoverable());
}

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        3 => "[a-c]{1,2}".prop_map(Segment::new),
        1 => ("[a-b]", "[0-2]", prop::sample::select(DynamicParamKind::ALL.to_vec()))
            .prop_map(|(name, value, kind)| Segment::param(name, value, kind)),
    ]
}

fn tree() -> impl Strategy<Value = RouterStateTree> {
    let leaf = (segment(), any::<bool>()).prop_map(|(segment, refetch)| {
        let node = RouterStateTree::new(segment);
        if refetch { node.with_refetch() } else { node }
    });
    leaf.prop_recursive(3, 16, 3, |inner| {
        (
            segment(),
            prop::collection::vec(("children|modal|sidebar", inner), 0..3),
        )
            .prop_map(|(segment, children)| {
                let mut node = RouterStateTree::new(segment);
                for (key, child) in children {
                    node.parallel_routes.insert(key, Arc::new(child));
                }
                node
            })
    })
}

proptest! {
    #[test]
    fn prop_diff_then_apply_reaches_next(prev in tree(), next in tree()) {
        let paths = diff(&prev, &next, &(echo as LoaderFn), RenderMode::Full).unwrap();
        prop_assert!(paths_are_disjoint(&paths));

        let base = Arc::new(prev);
        let navigation = apply_flight_data(&base, &FlightData::Paths(paths.clone())).unwrap();
        let patched = navigation.tree().unwrap();
        prop_assert_eq!(&**patched, &next);

        // Replaying the same response is a no-op.
        let again = apply_flight_data(patched, &FlightData::Paths(paths)).unwrap();
        prop_assert_eq!(again.tree().unwrap(), patched);
    }

    #[test]
    fn prop_unchanged_tree_emits_nothing(t in tree()) {
        let t = strip_refetch(t);
        prop_assert!(diff(&t, &t.clone(), &(echo as LoaderFn), RenderMode::Full).unwrap().is_empty());
    }

    #[test]
    fn prop_wire_encoding_decodes_to_same_paths(prev in tree(), next in tree()) {
        let paths = diff(&prev, &next, &(echo as LoaderFn), RenderMode::Full).unwrap();
        let flight = FlightData::Paths(paths);
        prop_assert_eq!(FlightData::decode(&flight.encode()).unwrap(), flight);
    }
}

fn strip_refetch(mut node: RouterStateTree) -> RouterStateTree {
    node.refresh = None;
    for child in node.parallel_routes.values_mut() {
        *child = Arc::new(strip_refetch((**child).clone()));
    }
    node
}
