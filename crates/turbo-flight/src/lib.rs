//! Flight responses for TurboCommerce streaming navigation.
//!
//! The server computes a router state tree per request, diffs it against
//! the tree the client already holds, and streams the changed subtrees as
//! data paths inside a response envelope. The client walks each data path
//! and grafts the patch onto its own tree.
//!
//! This crate provides:
//! - `DataPath` / `FlightData` - addressed patch units and their wire codec
//! - `Envelope` - navigation and server-action response framing
//! - `FlightRenderer` - server side: diff and render responses
//! - `ResponseReader` / `apply_patch` - client side: validate and apply
//! - `RenderOptions` - per-build render configuration
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use turbo_flight::prelude::*;
//! use serde_json::json;
//!
//! let loader = |_: &SegmentPath, node: &RouterStateTree, _: RenderMode| -> anyhow::Result<RenderedSlice> {
//!     Ok(RenderedSlice::new(json!(node.segment.to_string())))
//! };
//! let renderer = FlightRenderer::new(RenderOptions::new("build-1"), loader);
//!
//! let before = RouterStateTree::new("").with_slot("children", RouterStateTree::new("home"));
//! let after = RouterStateTree::new("").with_slot("children", RouterStateTree::new("about"));
//! let response = renderer.render_navigation(Some(&before), &after, RenderMode::Full)?;
//!
//! let reader = ResponseReader::new("build-1");
//! let navigation = reader
//!     .navigate(&Arc::new(before), &response.encode(), EnvelopeContext::Navigation)?
//!     .expect("navigation carries flight data");
//! assert_eq!(navigation.tree().map(|tree| &**tree), Some(&after));
//! # Ok::<(), FlightError>(())
//! ```

mod client;
mod config;
mod data_path;
mod diff;
mod envelope;
mod error;
mod patch;
mod render;

pub use client::ResponseReader;
pub use config::{BodySizeLimit, OutputMode, RenderOptions, ServerRuntime};
pub use data_path::{paths_are_disjoint, DataPath, FlightData, Patch};
pub use diff::{diff, render_at};
pub use envelope::{
    parse_envelope, parse_envelope_with, ActionResponse, ActionResult, BuildId, Envelope,
    EnvelopeContext, NavigationResponse,
};
pub use error::{FlightError, Result};
pub use patch::{apply_flight_data, apply_patch, AppliedPatch, Navigation, SegmentContent};
pub use render::{ContentLoader, FlightRenderer, RenderMode, RenderedSlice};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        apply_flight_data, apply_patch, parse_envelope, BuildId, ContentLoader, DataPath,
        Envelope, EnvelopeContext, FlightData, FlightError, FlightRenderer, Navigation,
        RenderMode, RenderOptions, RenderedSlice, ResponseReader,
    };
    pub use turbo_router::{PathStep, RouterStateTree, Segment, SegmentPath};
}
