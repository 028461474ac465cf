//! Router state for TurboCommerce streaming navigation.
//!
//! The server describes the nested layouts of a route as a tree of
//! segments. Each node names parallel slots (`children`, `modal`, ...)
//! that hold child trees:
//!
//! ```text
//! ""                      (root layout)
//! ├── children: shop
//! │   └── children: [id=42:d]
//! └── modal: __DEFAULT__
//! ```
//!
//! This crate provides:
//! - `Segment` - static or dynamic route segment with its wire codec
//! - `RouterStateTree` - the recursive tree, decoded and validated from JSON
//! - `SegmentPath` - the location of one node, used to address patches
//! - `TreeLimits` - configurable structural limits for validation
//!
//! # Usage
//!
//! ```rust
//! use turbo_router::prelude::*;
//! use serde_json::json;
//!
//! let tree = RouterStateTree::decode(&json!([
//!     "dashboard",
//!     {"children": [["id", "42", "d"], {}]}
//! ]))?;
//!
//! let path = path_to(&tree, |node| node.segment.is_dynamic()).unwrap();
//! assert_eq!(path.target(), &Segment::dynamic("id", "42"));
//! # Ok::<(), RouterStateError>(())
//! ```

mod error;
mod limits;
mod path;
mod segment;
mod tree;
mod validate;

pub mod prelude;

pub use error::{Result, RouterStateError};
pub use limits::{TreeLimits, CHILDREN_SLOT};
pub use path::{path_to, PathStep, SegmentPath};
pub use segment::{DynamicParamKind, Segment, PAGE_SEGMENT};
pub use tree::{ParallelRoutes, RefreshMarker, RouterStateTree};
pub use validate::{check_limits, validate, validate_with};
