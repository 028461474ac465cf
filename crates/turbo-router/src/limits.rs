//! Structural limits applied when validating incoming router state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Name of the implicit slot every layout renders its page into.
pub const CHILDREN_SLOT: &str = "children";

/// Limits configuration for router state validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeLimits {
    /// Maximum nesting depth (the root is depth 0).
    pub max_depth: usize,
    /// Maximum number of parallel slots on a single node.
    pub max_parallel_routes: usize,
    /// Maximum length of a static name or parameter value.
    pub max_segment_len: usize,
    /// Framework-defined slot vocabulary. `None` accepts any key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_slots: Option<BTreeSet<String>>,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_parallel_routes: 32,
            max_segment_len: 2048,
            allowed_slots: None,
        }
    }
}

impl TreeLimits {
    /// Create limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tight limits for payloads from untrusted peers.
    pub fn strict() -> Self {
        Self {
            max_depth: 16,
            max_parallel_routes: 8,
            max_segment_len: 256,
            allowed_slots: None,
        }
    }

    /// Effectively unbounded limits for development.
    pub fn permissive() -> Self {
        Self {
            max_depth: usize::MAX,
            max_parallel_routes: usize::MAX,
            max_segment_len: usize::MAX,
            allowed_slots: None,
        }
    }

    /// Restrict slot keys to the given vocabulary.
    ///
    /// `children` is always allowed.
    pub fn with_allowed_slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: BTreeSet<String> = slots.into_iter().map(Into::into).collect();
        set.insert(CHILDREN_SLOT.to_string());
        self.allowed_slots = Some(set);
        self
    }

    /// Set maximum depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Check whether a slot key is part of the configured vocabulary.
    pub fn allows_slot(&self, key: &str) -> bool {
        match &self.allowed_slots {
            Some(slots) => slots.contains(key),
            None => true,
        }
    }
}
