//! Segment paths: the location of one node inside a router state tree.
//!
//! On the wire a path is a flat, odd-length sequence that alternates
//! segments and slot keys, starting and ending on a segment:
//!
//! ```text
//! [seg0, key0, seg1, key1, ..., segN]
//! ```
//!
//! Here it is a list of [`PathStep`]s followed by the target segment.

use std::fmt;

use serde_json::Value;

use crate::error::{type_name, Result, RouterStateError};
use crate::segment::Segment;
use crate::tree::RouterStateTree;

/// One hop of a walk: the segment of the node being left and the slot taken.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    /// Segment of the parent node.
    pub segment: Segment,
    /// Slot key followed from the parent.
    pub parallel_route_key: String,
}

impl PathStep {
    /// Create a new step.
    pub fn new(segment: impl Into<Segment>, key: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            parallel_route_key: key.into(),
        }
    }
}

/// A walk from the tree root to a target node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentPath {
    steps: Vec<PathStep>,
    target: Segment,
}

impl SegmentPath {
    /// Path addressing the root node itself.
    pub fn root(segment: impl Into<Segment>) -> Self {
        Self {
            steps: Vec::new(),
            target: segment.into(),
        }
    }

    /// Build a path from its steps and target segment.
    pub fn new(steps: Vec<PathStep>, target: impl Into<Segment>) -> Self {
        Self {
            steps,
            target: target.into(),
        }
    }

    /// Extend the path through a slot of the current target.
    pub fn child(&self, key: impl Into<String>, segment: impl Into<Segment>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep {
            segment: self.target.clone(),
            parallel_route_key: key.into(),
        });
        Self {
            steps,
            target: segment.into(),
        }
    }

    /// Steps taken from the root.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Segment of the target node.
    pub fn target(&self) -> &Segment {
        &self.target
    }

    /// Number of slots traversed (0 for the root).
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Number of wire elements; always odd.
    pub fn len(&self) -> usize {
        self.steps.len() * 2 + 1
    }

    /// Paths always contain at least the target segment.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Segments visited from the root to the target, inclusive.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.steps
            .iter()
            .map(|step| &step.segment)
            .chain(std::iter::once(&self.target))
    }

    /// Check whether `other` walks through the node this path addresses.
    ///
    /// Segments are compared with [`Segment::matches`], the same rule used
    /// when resolving a path against a tree. A path is a prefix of itself.
    pub fn is_prefix_of(&self, other: &SegmentPath) -> bool {
        if self.steps.len() > other.steps.len() {
            return false;
        }
        let diverges = self.steps.iter().zip(&other.steps).any(|(a, b)| {
            a.parallel_route_key != b.parallel_route_key || !a.segment.matches(&b.segment)
        });
        if diverges {
            return false;
        }
        let at_node = match other.steps.get(self.steps.len()) {
            Some(step) => &step.segment,
            None => &other.target,
        };
        self.target.matches(at_node)
    }

    /// Encode to the flat wire form.
    pub fn encode(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.len());
        for step in &self.steps {
            out.push(step.segment.encode());
            out.push(Value::String(step.parallel_route_key.clone()));
        }
        out.push(self.target.encode());
        out
    }

    /// Decode from the flat wire form.
    pub fn decode(elements: &[Value]) -> Result<Self> {
        Self::decode_at(elements, "")
    }

    pub(crate) fn decode_at(elements: &[Value], at: &str) -> Result<Self> {
        if elements.len() % 2 == 0 {
            return Err(RouterStateError::schema(
                at,
                format!("segment path must have odd length, got {}", elements.len()),
            ));
        }
        let (target, pairs) = elements
            .split_last()
            .ok_or_else(|| RouterStateError::schema(at, "empty segment path"))?;
        let mut steps = Vec::with_capacity(pairs.len() / 2);
        for (i, pair) in pairs.chunks_exact(2).enumerate() {
            let segment = Segment::decode_at(&pair[0], &format!("{at}/{}", i * 2))?;
            let key = pair[1].as_str().ok_or_else(|| {
                RouterStateError::schema(
                    format!("{at}/{}", i * 2 + 1),
                    format!("expected slot key string, got {}", type_name(&pair[1])),
                )
            })?;
            steps.push(PathStep::new(segment, key));
        }
        let target = Segment::decode_at(target, &format!("{at}/{}", elements.len() - 1))?;
        Ok(Self { steps, target })
    }
}

impl fmt::Display for SegmentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{} -{}-> ", step.segment, step.parallel_route_key)?;
        }
        write!(f, "{}", self.target)
    }
}

/// Find the first node (depth-first, slot order) that satisfies `predicate`.
pub fn path_to<F>(tree: &RouterStateTree, mut predicate: F) -> Option<SegmentPath>
where
    F: FnMut(&RouterStateTree) -> bool,
{
    find(tree, SegmentPath::root(tree.segment.clone()), &mut predicate)
}

fn find<F>(node: &RouterStateTree, path: SegmentPath, predicate: &mut F) -> Option<SegmentPath>
where
    F: FnMut(&RouterStateTree) -> bool,
{
    if predicate(node) {
        return Some(path);
    }
    for (key, child) in &node.parallel_routes {
        let child_path = path.child(key.clone(), child.segment.clone());
        if let Some(found) = find(child, child_path, predicate) {
            return Some(found);
        }
    }
    None
}
