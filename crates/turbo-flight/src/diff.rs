//! Server-side diff between two router state trees.
//!
//! Both trees are walked in lock-step over their shared slots. A node is
//! re-emitted wholesale when its own fields differ, when its slot key set
//! changed, when it carries the refetch marker, or when the content loader
//! asks for a re-render. Otherwise the walk descends into every slot.
//! Subtrees shared between both trees are walked too, so the outcome
//! depends only on tree values, never on how they were allocated.
//!
//! Since an emitted node is never descended into, the emitted paths are
//! disjoint and every slot key on them exists in the previous tree.

use turbo_router::{PathStep, RouterStateTree, SegmentPath};

use crate::data_path::{DataPath, Patch};
use crate::error::Result;
use crate::render::{ContentLoader, RenderMode};

/// Compute the data paths turning `prev` into `next`.
pub fn diff<L>(
    prev: &RouterStateTree,
    next: &RouterStateTree,
    loader: &L,
    mode: RenderMode,
) -> Result<Vec<DataPath>>
where
    L: ContentLoader + ?Sized,
{
    let mut out = Vec::new();
    walk(prev, next, &mut Vec::new(), loader, mode, &mut out)?;
    Ok(out)
}

/// Render `node` at the location described by `steps` into a data path.
pub fn render_at<L>(
    steps: Vec<PathStep>,
    node: &RouterStateTree,
    loader: &L,
    mode: RenderMode,
) -> Result<DataPath>
where
    L: ContentLoader + ?Sized,
{
    let path = SegmentPath::new(steps, node.segment.clone());
    let slice = loader.load(&path, node, mode)?;
    tracing::debug!(
        depth = path.depth(),
        segment = %node.segment,
        has_content = slice.sub_tree_data.is_some(),
        "emitting data path"
    );
    let mut patch = Patch::new(node.clone());
    patch.sub_tree_data = slice.sub_tree_data;
    patch.head = slice.head;
    Ok(DataPath::new(path.steps().to_vec(), patch))
}

fn walk<L>(
    prev: &RouterStateTree,
    next: &RouterStateTree,
    steps: &mut Vec<PathStep>,
    loader: &L,
    mode: RenderMode,
    out: &mut Vec<DataPath>,
) -> Result<()>
where
    L: ContentLoader + ?Sized,
{
    let changed = !prev.same_shape(next)
        || next.needs_refetch()
        || loader.needs_render(&SegmentPath::new(steps.clone(), next.segment.clone()), next);
    if changed {
        out.push(render_at(steps.clone(), next, loader, mode)?);
        return Ok(());
    }

    for (key, next_child) in &next.parallel_routes {
        // same_shape guarantees the key exists on both sides.
        let Some(prev_child) = prev.parallel_routes.get(key) else {
            continue;
        };
        tracing::trace!(slot = %key, depth = steps.len(), "descending into slot");
        steps.push(PathStep::new(next.segment.clone(), key.clone()));
        let result = walk(prev_child, next_child, steps, loader, mode, out);
        steps.pop();
        result?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_path::paths_are_disjoint;
    use crate::render::RenderedSlice;
    use serde_json::json;
    use std::cell::RefCell;
    use std::sync::Arc;
    use turbo_router::Segment;

    fn loader(path: &SegmentPath, node: &RouterStateTree, _mode: RenderMode) -> anyhow::Result<RenderedSlice> {
        Ok(RenderedSlice::new(json!({"rendered": node.segment.to_string(), "depth": path.depth()})))
    }

    fn shop(item: &str) -> RouterStateTree {
        RouterStateTree::new("")
            .with_slot(
                "children",
                RouterStateTree::new("shop")
                    .with_slot("children", RouterStateTree::new(Segment::dynamic("id", item))),
            )
            .with_slot("cart", RouterStateTree::new("summary"))
            .root_layout()
    }

    #[test]
    fn test_identical_trees_emit_nothing() {
        assert!(diff(&shop("1"), &shop("1"), &loader, RenderMode::Full).unwrap().is_empty());
    }

    #[test]
    fn test_param_change_emits_one_path() {
        let paths = diff(&shop("1"), &shop("2"), &loader, RenderMode::Full).unwrap();
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert_eq!(
            path.steps,
            vec![PathStep::new("", "children"), PathStep::new("shop", "children")]
        );
        assert_eq!(path.patch.segment, Segment::dynamic("id", "2"));
        assert_eq!(path.patch.sub_tree_data, Some(json!({"rendered": "[id=2:d]", "depth": 2})));
    }

    #[test]
    fn test_each_changed_slot_gets_its_own_path() {
        let mut next = shop("2");
        let cart = Arc::make_mut(next.parallel_routes.get_mut("cart").unwrap());
        cart.segment = Segment::new("checkout");
        let paths = diff(&shop("1"), &next, &loader, RenderMode::Full).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths_are_disjoint(&paths));
        assert_eq!(paths[1].steps, vec![PathStep::new("", "cart")]);
    }

    #[test]
    fn test_removed_slot_reemits_parent() {
        let prev = shop("1");
        let mut next = shop("1");
        next.parallel_routes.shift_remove("cart");
        let paths = diff(&prev, &next, &loader, RenderMode::Full).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].is_root());
        assert!(paths[0].patch.tree.slot("cart").is_none());
    }

    #[test]
    fn test_added_slot_reemits_parent() {
        let prev = shop("1");
        let next = shop("1").with_slot("modal", RouterStateTree::new("login"));
        let paths = diff(&prev, &next, &loader, RenderMode::Full).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].is_root());
    }

    #[test]
    fn test_refetch_marker_forces_render() {
        let prev = shop("1");
        let mut next = shop("1");
        let cart = Arc::make_mut(next.parallel_routes.get_mut("cart").unwrap());
        cart.refresh = Some(turbo_router::RefreshMarker::Refetch);
        let paths = diff(&prev, &next, &loader, RenderMode::Full).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].patch.segment, Segment::new("summary"));
    }

    struct Revalidate(&'static str);

    impl ContentLoader for Revalidate {
        fn load(&self, _: &SegmentPath, node: &RouterStateTree, _: RenderMode) -> anyhow::Result<RenderedSlice> {
            Ok(RenderedSlice::new(json!(node.segment.to_string())))
        }

        fn needs_render(&self, _: &SegmentPath, node: &RouterStateTree) -> bool {
            node.segment == Segment::new(self.0)
        }
    }

    #[test]
    fn test_revalidation_inside_shared_subtree() {
        let prev = shop("1");
        let shared = prev.clone();
        let deep = RouterStateTree::decode(&prev.encode()).unwrap();

        let from_shared = diff(&prev, &shared, &Revalidate("summary"), RenderMode::Full).unwrap();
        let from_deep = diff(&prev, &deep, &Revalidate("summary"), RenderMode::Full).unwrap();
        assert_eq!(from_shared.len(), 1);
        assert_eq!(from_shared[0].steps, vec![PathStep::new("", "cart")]);
        assert_eq!(from_shared, from_deep);
    }

    #[test]
    fn test_refetch_inside_shared_subtree() {
        let prev = shop("1").with_slot("cart", RouterStateTree::new("summary").with_refetch());
        let next = prev.clone();
        let paths = diff(&prev, &next, &loader, RenderMode::Full).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].patch.segment, Segment::new("summary"));
        assert!(paths[0].patch.tree.needs_refetch());
    }

    #[test]
    fn test_walk_visits_every_node() {
        struct Counting(RefCell<Vec<String>>);
        impl ContentLoader for Counting {
            fn load(&self, _: &SegmentPath, node: &RouterStateTree, _: RenderMode) -> anyhow::Result<RenderedSlice> {
                Ok(RenderedSlice::new(json!(node.segment.to_string())))
            }
            fn needs_render(&self, _: &SegmentPath, node: &RouterStateTree) -> bool {
                self.0.borrow_mut().push(node.segment.to_string());
                false
            }
        }

        let prev = shop("1");
        let next = prev.clone();
        let counting = Counting(RefCell::new(Vec::new()));
        assert!(diff(&prev, &next, &counting, RenderMode::Full).unwrap().is_empty());
        assert_eq!(counting.0.borrow().as_slice(), ["", "shop", "[id=1:d]", "summary"]);
    }

    #[test]
    fn test_loader_failure_propagates() {
        let failing = |_: &SegmentPath, _: &RouterStateTree, _: RenderMode| -> anyhow::Result<RenderedSlice> {
            Err(anyhow::anyhow!("backend down"))
        };
        let err = diff(&shop("1"), &shop("2"), &failing, RenderMode::Full).unwrap_err();
        assert!(matches!(err, crate::FlightError::ContentLoad(_)));
    }
}
