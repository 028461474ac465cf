//! Data paths and flight data.
//!
//! A data path is one streamed update unit. On the wire it is a segment
//! path followed by the tree patch and its rendered content:
//!
//! ```text
//! [seg0, key0, ..., segment, treePatch, subTreeData | null, head | null]
//! ```
//!
//! Flight data is either a list of data paths or a single string, the
//! latter being an out-of-band instruction such as a redirect.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use turbo_router::{PathStep, RouterStateTree, Segment, SegmentPath, TreeLimits};

use crate::error::{FlightError, Result};

/// Terminal payload of a data path.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Segment of the rendered slice.
    pub segment: Segment,
    /// Router state replacing the addressed subtree.
    pub tree: RouterStateTree,
    /// Rendered subtree. `None` when content is withheld, e.g. during prefetch.
    pub sub_tree_data: Option<Value>,
    /// Rendered head content.
    pub head: Option<Value>,
}

impl Patch {
    /// Create a patch whose segment is taken from the tree.
    pub fn new(tree: RouterStateTree) -> Self {
        Self {
            segment: tree.segment.clone(),
            tree,
            sub_tree_data: None,
            head: None,
        }
    }

    /// Set rendered subtree content.
    pub fn with_sub_tree_data(mut self, content: Value) -> Self {
        self.sub_tree_data = Some(content);
        self
    }

    /// Set rendered head content.
    pub fn with_head(mut self, head: Value) -> Self {
        self.head = Some(head);
        self
    }
}

/// One addressed patch: where to graft, and what.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPath {
    /// Steps from the root to the parent of the patched node.
    pub steps: Vec<PathStep>,
    /// The patch grafted at the end of the steps.
    pub patch: Patch,
}

impl DataPath {
    /// Create a data path.
    pub fn new(steps: Vec<PathStep>, patch: Patch) -> Self {
        Self { steps, patch }
    }

    /// Data path replacing the whole tree.
    pub fn root(patch: Patch) -> Self {
        Self::new(Vec::new(), patch)
    }

    /// The segment path addressing the patched node.
    pub fn segment_path(&self) -> SegmentPath {
        SegmentPath::new(self.steps.clone(), self.patch.segment.clone())
    }

    /// Check if this path replaces the whole tree.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Encode to the flat wire form.
    pub fn encode(&self) -> Value {
        let mut items = self.segment_path().encode();
        items.push(self.patch.tree.encode());
        items.push(self.patch.sub_tree_data.clone().unwrap_or(Value::Null));
        items.push(self.patch.head.clone().unwrap_or(Value::Null));
        Value::Array(items)
    }

    /// Decode without structural limits.
    pub fn decode(value: &Value) -> Result<Self> {
        Self::decode_with(value, &TreeLimits::permissive())
    }

    /// Decode against the given tree limits.
    pub fn decode_with(value: &Value, limits: &TreeLimits) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| FlightError::schema("", "data path must be an array"))?;
        if items.len() < 4 || items.len() % 2 != 0 {
            return Err(FlightError::schema(
                "",
                format!(
                    "data path must have an even length of at least 4, got {}",
                    items.len()
                ),
            ));
        }

        let split = items.len() - 3;
        let path = SegmentPath::decode(&items[..split])?;
        let tree = RouterStateTree::decode_with(&items[split], limits)?;
        if path.target() != &tree.segment {
            return Err(FlightError::schema(
                format!("/{}", split - 1),
                format!(
                    "rendered segment {} does not match tree patch segment {}",
                    path.target(),
                    tree.segment
                ),
            ));
        }

        let content = |value: &Value| match value {
            Value::Null => None,
            other => Some(other.clone()),
        };

        Ok(Self {
            steps: path.steps().to_vec(),
            patch: Patch {
                segment: path.target().clone(),
                tree,
                sub_tree_data: content(&items[split + 1]),
                head: content(&items[split + 2]),
            },
        })
    }
}

/// Check that no data path addresses a node inside another one's subtree.
pub fn paths_are_disjoint(paths: &[DataPath]) -> bool {
    let segment_paths: Vec<SegmentPath> = paths.iter().map(DataPath::segment_path).collect();
    segment_paths.iter().enumerate().all(|(i, a)| {
        segment_paths
            .iter()
            .skip(i + 1)
            .all(|b| !a.is_prefix_of(b) && !b.is_prefix_of(a))
    })
}

/// Payload of a flight response.
#[derive(Debug, Clone, PartialEq)]
pub enum FlightData {
    /// Tree updates to apply.
    Paths(Vec<DataPath>),
    /// Out-of-band instruction, e.g. a full-document redirect target.
    Redirect(String),
}

impl FlightData {
    /// Check if this is the out-of-band string form.
    pub fn is_redirect(&self) -> bool {
        matches!(self, FlightData::Redirect(_))
    }

    /// Get the data paths, if this is tree data.
    pub fn paths(&self) -> Option<&[DataPath]> {
        match self {
            FlightData::Paths(paths) => Some(paths),
            FlightData::Redirect(_) => None,
        }
    }

    /// Encode to the wire value.
    pub fn encode(&self) -> Value {
        match self {
            FlightData::Paths(paths) => Value::Array(paths.iter().map(DataPath::encode).collect()),
            FlightData::Redirect(url) => Value::String(url.clone()),
        }
    }

    /// Decode without structural limits.
    pub fn decode(value: &Value) -> Result<Self> {
        Self::decode_with(value, &TreeLimits::permissive())
    }

    /// Decode against the given tree limits.
    pub fn decode_with(value: &Value, limits: &TreeLimits) -> Result<Self> {
        match value {
            Value::String(url) => Ok(FlightData::Redirect(url.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| DataPath::decode_with(item, limits))
                .collect::<Result<Vec<_>>>()
                .map(FlightData::Paths),
            _ => Err(FlightError::schema(
                "",
                "flight data must be an array of data paths or a string",
            )),
        }
    }
}

impl From<Vec<DataPath>> for FlightData {
    fn from(paths: Vec<DataPath>) -> Self {
        FlightData::Paths(paths)
    }
}

impl Serialize for DataPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.encode().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode(&value).map_err(D::Error::custom)
    }
}

impl Serialize for FlightData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.encode().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FlightData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode(&value).map_err(D::Error::custom)
    }
}
