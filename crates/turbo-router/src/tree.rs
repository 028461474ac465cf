//! The router state tree.
//!
//! Wire shape of a node:
//!
//! ```text
//! [segment, { slotKey: node, ... }, url?, refresh?, isRootLayout?]
//! ```
//!
//! Children are stored behind [`Arc`] so a patched tree can share every
//! untouched subtree with the tree it was derived from.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{type_name, Result, RouterStateError};
use crate::limits::TreeLimits;
use crate::path::SegmentPath;
use crate::segment::Segment;

/// Named parallel sub-trees of a node, in stable insertion order.
pub type ParallelRoutes = IndexMap<String, Arc<RouterStateTree>>;

/// Marker asking the client to re-request a subtree instead of trusting its cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshMarker {
    Refetch,
}

impl RefreshMarker {
    /// Wire literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refetch => "refetch",
        }
    }
}

/// One node of the router state tree together with all of its descendants.
///
/// Equality is structural: slot order does not take part in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterStateTree {
    /// Segment for this node.
    pub segment: Segment,
    /// Parallel slots keyed by slot name.
    pub parallel_routes: ParallelRoutes,
    /// Override URL when the canonical URL differs from the navigated one.
    pub url: Option<String>,
    /// Refetch marker.
    pub refresh: Option<RefreshMarker>,
    /// Marks the outermost layout boundary.
    pub is_root_layout: bool,
}

impl RouterStateTree {
    /// Create a leaf node.
    pub fn new(segment: impl Into<Segment>) -> Self {
        Self {
            segment: segment.into(),
            parallel_routes: IndexMap::new(),
            url: None,
            refresh: None,
            is_root_layout: false,
        }
    }

    /// Create a leaf page node.
    pub fn page() -> Self {
        Self::new(Segment::page())
    }

    /// Add a child under the given slot key.
    pub fn with_slot(self, key: impl Into<String>, child: RouterStateTree) -> Self {
        self.with_shared_slot(key, Arc::new(child))
    }

    /// Add an already shared child under the given slot key.
    pub fn with_shared_slot(mut self, key: impl Into<String>, child: Arc<RouterStateTree>) -> Self {
        self.parallel_routes.insert(key.into(), child);
        self
    }

    /// Set the override URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Mark this subtree for refetch.
    pub fn with_refetch(mut self) -> Self {
        self.refresh = Some(RefreshMarker::Refetch);
        self
    }

    /// Mark this node as the root layout.
    pub fn root_layout(mut self) -> Self {
        self.is_root_layout = true;
        self
    }

    /// Get the child in a slot.
    pub fn slot(&self, key: &str) -> Option<&Arc<RouterStateTree>> {
        self.parallel_routes.get(key)
    }

    /// Check if this node must be refetched.
    pub fn needs_refetch(&self) -> bool {
        self.refresh == Some(RefreshMarker::Refetch)
    }

    /// Check if this node has no slots.
    pub fn is_leaf(&self) -> bool {
        self.parallel_routes.is_empty()
    }

    /// Whether the node-level fields (everything except the children) are equal,
    /// and both nodes expose the same slot keys.
    pub fn same_shape(&self, other: &RouterStateTree) -> bool {
        self.segment == other.segment
            && self.url == other.url
            && self.refresh == other.refresh
            && self.is_root_layout == other.is_root_layout
            && self.parallel_routes.len() == other.parallel_routes.len()
            && self
                .parallel_routes
                .keys()
                .all(|key| other.parallel_routes.contains_key(key))
    }

    /// Longest chain of nodes below this one (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.parallel_routes
            .values()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self
            .parallel_routes
            .values()
            .map(|child| child.node_count())
            .sum::<usize>()
    }

    /// Resolve a segment path starting at this node.
    pub fn node_at(&self, path: &SegmentPath) -> Option<&RouterStateTree> {
        let mut node = self;
        for step in path.steps() {
            if !node.segment.matches(&step.segment) {
                return None;
            }
            node = node.parallel_routes.get(&step.parallel_route_key)?;
        }
        node.segment.matches(path.target()).then_some(node)
    }

    /// Paths of every node carrying the refetch marker, depth-first.
    ///
    /// A marked node's descendants are not reported separately since the
    /// whole subtree is refetched.
    pub fn refetch_paths(&self) -> Vec<SegmentPath> {
        let mut out = Vec::new();
        collect_refetch(self, SegmentPath::root(self.segment.clone()), &mut out);
        out
    }

    /// Decode and validate a tree against the wire schema alone.
    pub fn decode(value: &Value) -> Result<Self> {
        Self::decode_with(value, &TreeLimits::permissive())
    }

    /// Decode and validate a tree against the given limits.
    pub fn decode_with(value: &Value, limits: &TreeLimits) -> Result<Self> {
        decode_node(value, "", 0, limits)
    }

    /// Encode the tree to its wire value.
    pub fn encode(&self) -> Value {
        let mut routes = Map::new();
        for (key, child) in &self.parallel_routes {
            routes.insert(key.clone(), child.encode());
        }
        let mut items = vec![
            self.segment.encode(),
            Value::Object(routes),
            self.url.clone().map(Value::String).unwrap_or(Value::Null),
            self.refresh
                .map(|marker| Value::String(marker.as_str().to_string()))
                .unwrap_or(Value::Null),
        ];
        if self.is_root_layout {
            items.push(Value::Bool(true));
        }
        Value::Array(items)
    }
}

fn collect_refetch(node: &RouterStateTree, path: SegmentPath, out: &mut Vec<SegmentPath>) {
    if node.needs_refetch() {
        out.push(path);
        return;
    }
    for (key, child) in &node.parallel_routes {
        collect_refetch(child, path.child(key.clone(), child.segment.clone()), out);
    }
}

fn decode_node(value: &Value, at: &str, depth: usize, limits: &TreeLimits) -> Result<RouterStateTree> {
    if depth > limits.max_depth {
        return Err(RouterStateError::LimitExceeded(format!(
            "tree depth exceeds {} at {}",
            limits.max_depth, at
        )));
    }

    let items = value.as_array().ok_or_else(|| {
        RouterStateError::schema(at, format!("expected router state tuple, got {}", type_name(value)))
    })?;
    if !(2..=5).contains(&items.len()) {
        return Err(RouterStateError::schema(
            at,
            format!("router state tuple must have 2 to 5 elements, got {}", items.len()),
        ));
    }

    let segment_at = format!("{at}/0");
    let segment = Segment::decode_at(&items[0], &segment_at)?;
    check_segment_len(&segment, &segment_at, limits)?;

    let routes_at = format!("{at}/1");
    let routes = items[1].as_object().ok_or_else(|| {
        RouterStateError::schema(
            &routes_at,
            format!("expected parallel routes object, got {}", type_name(&items[1])),
        )
    })?;
    if routes.len() > limits.max_parallel_routes {
        return Err(RouterStateError::LimitExceeded(format!(
            "{} parallel routes at {} (max {})",
            routes.len(),
            routes_at,
            limits.max_parallel_routes
        )));
    }

    let mut parallel_routes = IndexMap::with_capacity(routes.len());
    for (key, child) in routes {
        if !limits.allows_slot(key) {
            return Err(RouterStateError::schema(
                &routes_at,
                format!("slot key {:?} is not part of the allowed vocabulary", key),
            ));
        }
        let child_at = format!("{routes_at}/{key}");
        let child = decode_node(child, &child_at, depth + 1, limits)?;
        parallel_routes.insert(key.clone(), Arc::new(child));
    }

    let url = match items.get(2) {
        None | Some(Value::Null) => None,
        Some(Value::String(url)) => Some(url.clone()),
        Some(other) => {
            return Err(RouterStateError::schema(
                format!("{at}/2"),
                format!("expected url string or null, got {}", type_name(other)),
            ))
        }
    };

    let refresh = match items.get(3) {
        None | Some(Value::Null) => None,
        Some(Value::String(marker)) if marker == "refetch" => Some(RefreshMarker::Refetch),
        Some(other) => {
            return Err(RouterStateError::schema(
                format!("{at}/3"),
                format!("expected \"refetch\" or null, got {}", other),
            ))
        }
    };

    let is_root_layout = match items.get(4) {
        None => false,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            return Err(RouterStateError::schema(
                format!("{at}/4"),
                format!("expected boolean, got {}", type_name(other)),
            ))
        }
    };

    Ok(RouterStateTree {
        segment,
        parallel_routes,
        url,
        refresh,
        is_root_layout,
    })
}

pub(crate) fn check_segment_len(segment: &Segment, at: &str, limits: &TreeLimits) -> Result<()> {
    let len = match segment {
        Segment::Static(name) => name.len(),
        Segment::Param { name, value, .. } => name.len().max(value.len()),
    };
    if len > limits.max_segment_len {
        return Err(RouterStateError::LimitExceeded(format!(
            "segment at {} is {} bytes (max {})",
            at, len, limits.max_segment_len
        )));
    }
    Ok(())
}

impl fmt::Display for RouterStateTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl Serialize for RouterStateTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.encode().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RouterStateTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode(&value).map_err(D::Error::custom)
    }
}
