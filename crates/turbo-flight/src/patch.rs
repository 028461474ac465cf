//! Client-side patch application.
//!
//! Applying a data path walks the client tree along its steps and replaces
//! the addressed slot wholesale. Ancestors on the walk are rebuilt; every
//! other subtree is shared with the previous tree through its [`Arc`].

use std::sync::Arc;

use serde_json::Value;
use turbo_router::{PathStep, RouterStateError, RouterStateTree, SegmentPath};

use crate::data_path::{paths_are_disjoint, DataPath, FlightData};
use crate::error::Result;

/// Rendered content associated with a patched node.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentContent {
    /// Location of the patched node.
    pub path: SegmentPath,
    /// Rendered subtree. `None` means the tree is partial here.
    pub current: Option<Value>,
    /// Rendered head.
    pub head: Option<Value>,
}

/// Result of applying one data path.
#[derive(Debug, Clone)]
pub struct AppliedPatch {
    /// The new client tree.
    pub tree: Arc<RouterStateTree>,
    /// Content for the content-rendering layer.
    pub content: SegmentContent,
}

/// Apply one data path to the client tree.
///
/// Fails with `PathNotFound` when any segment or slot key on the walk is
/// missing from `base`; nothing is partially applied in that case.
pub fn apply_patch(base: &Arc<RouterStateTree>, data_path: &DataPath) -> Result<AppliedPatch> {
    let patch_tree = Arc::new(data_path.patch.tree.clone());
    let tree = if data_path.steps.is_empty() {
        patch_tree
    } else {
        Arc::new(graft(base, &data_path.steps, 0, &patch_tree).inspect_err(|err| {
            tracing::warn!(error = %err, "patch does not resolve against client tree");
        })?)
    };

    tracing::debug!(
        depth = data_path.steps.len(),
        segment = %data_path.patch.segment,
        "applied patch"
    );

    Ok(AppliedPatch {
        tree,
        content: SegmentContent {
            path: data_path.segment_path(),
            current: data_path.patch.sub_tree_data.clone(),
            head: data_path.patch.head.clone(),
        },
    })
}

fn graft(
    node: &RouterStateTree,
    steps: &[PathStep],
    depth: usize,
    patch: &Arc<RouterStateTree>,
) -> std::result::Result<RouterStateTree, RouterStateError> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(node.clone());
    };
    if !node.segment.matches(&step.segment) {
        return Err(RouterStateError::PathNotFound {
            depth,
            reason: format!("expected segment {}, found {}", step.segment, node.segment),
        });
    }
    let key = &step.parallel_route_key;
    let child = node.parallel_routes.get(key).ok_or_else(|| RouterStateError::PathNotFound {
        depth,
        reason: format!("slot {:?} missing under {}", key, node.segment),
    })?;

    let replacement = if rest.is_empty() {
        Arc::clone(patch)
    } else {
        Arc::new(graft(child, rest, depth + 1, patch)?)
    };

    let mut rebuilt = node.clone();
    rebuilt.parallel_routes.insert(key.clone(), replacement);
    Ok(rebuilt)
}

/// Outcome of applying a flight payload.
#[derive(Debug, Clone)]
pub enum Navigation {
    /// Out-of-band string payload; the tree was not touched.
    Redirect(String),
    /// Every data path was applied.
    Patched {
        tree: Arc<RouterStateTree>,
        contents: Vec<SegmentContent>,
    },
}

impl Navigation {
    /// Get the patched tree, if any.
    pub fn tree(&self) -> Option<&Arc<RouterStateTree>> {
        match self {
            Navigation::Redirect(_) => None,
            Navigation::Patched { tree, .. } => Some(tree),
        }
    }
}

/// Apply a whole flight payload against one base snapshot.
///
/// The string form is returned as a redirect without walking anything. Data
/// paths of one response address disjoint subtrees, so applying them in
/// sequence equals applying each to the base and merging.
pub fn apply_flight_data(base: &Arc<RouterStateTree>, flight_data: &FlightData) -> Result<Navigation> {
    let paths = match flight_data {
        FlightData::Redirect(url) => return Ok(Navigation::Redirect(url.clone())),
        FlightData::Paths(paths) => paths,
    };
    debug_assert!(paths_are_disjoint(paths), "overlapping data paths in one response");

    let mut tree = Arc::clone(base);
    let mut contents = Vec::with_capacity(paths.len());
    for data_path in paths {
        let applied = apply_patch(&tree, data_path)?;
        tree = applied.tree;
        contents.push(applied.content);
    }
    Ok(Navigation::Patched { tree, contents })
}
