//! Validation of router state against the wire schema and configured limits.

use serde_json::Value;

use crate::error::{Result, RouterStateError};
use crate::limits::TreeLimits;
use crate::tree::{check_segment_len, RouterStateTree};

/// Validate a candidate wire value against the router state schema alone.
///
/// No structural limits apply; use [`validate_with`] to enforce them.
pub fn validate(candidate: &Value) -> Result<()> {
    validate_with(candidate, &TreeLimits::permissive())
}

/// Validate a candidate wire value against the given limits.
///
/// Any failure rejects the whole tree; nothing is partially accepted.
pub fn validate_with(candidate: &Value, limits: &TreeLimits) -> Result<()> {
    RouterStateTree::decode_with(candidate, limits)
        .map(|_| ())
        .inspect_err(|err| tracing::debug!(error = %err, "rejected router state"))
}

/// Check an already constructed tree against the given limits.
///
/// Trees built in-process are well-typed by construction; this only
/// enforces the configurable limits before a tree is sent.
pub fn check_limits(tree: &RouterStateTree, limits: &TreeLimits) -> Result<()> {
    check_node(tree, "", 0, limits)
}

fn check_node(node: &RouterStateTree, at: &str, depth: usize, limits: &TreeLimits) -> Result<()> {
    if depth > limits.max_depth {
        return Err(RouterStateError::LimitExceeded(format!(
            "tree depth exceeds {} at {}",
            limits.max_depth, at
        )));
    }
    check_segment_len(&node.segment, &format!("{at}/0"), limits)?;
    if node.parallel_routes.len() > limits.max_parallel_routes {
        return Err(RouterStateError::LimitExceeded(format!(
            "{} parallel routes at {}/1 (max {})",
            node.parallel_routes.len(),
            at,
            limits.max_parallel_routes
        )));
    }
    for (key, child) in &node.parallel_routes {
        if !limits.allows_slot(key) {
            return Err(RouterStateError::schema(
                format!("{at}/1"),
                format!("slot key {:?} is not part of the allowed vocabulary", key),
            ));
        }
        check_node(child, &format!("{at}/1/{key}"), depth + 1, limits)?;
    }
    Ok(())
}
