//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use turbo_router::prelude::*;
//! ```

pub use crate::{
    path_to, validate, DynamicParamKind, PathStep, RefreshMarker, RouterStateError,
    RouterStateTree, Segment, SegmentPath, TreeLimits,
};
