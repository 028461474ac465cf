//! Content loading and the server-side flight renderer.

use serde_json::Value;
use turbo_router::{check_limits, RouterStateTree, SegmentPath};

use crate::config::RenderOptions;
use crate::data_path::{DataPath, FlightData};
use crate::diff::{diff, render_at};
use crate::envelope::{ActionResponse, ActionResult, BuildId, NavigationResponse};
use crate::error::Result;

/// Whether content is rendered in full or withheld where allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Regular navigation: render everything.
    #[default]
    Full,
    /// Prefetch: content may be withheld for segments without a loading boundary.
    Prefetch,
}

impl RenderMode {
    /// Check if this is a prefetch render.
    pub fn is_prefetch(&self) -> bool {
        matches!(self, Self::Prefetch)
    }
}

/// Rendered content for one slice of the tree. Both values are opaque.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedSlice {
    pub sub_tree_data: Option<Value>,
    pub head: Option<Value>,
}

impl RenderedSlice {
    /// Slice with rendered subtree content and no head.
    pub fn new(sub_tree_data: Value) -> Self {
        Self {
            sub_tree_data: Some(sub_tree_data),
            head: None,
        }
    }

    /// Slice with content withheld.
    pub fn withheld() -> Self {
        Self::default()
    }

    /// Set rendered head content.
    pub fn with_head(mut self, head: Value) -> Self {
        self.head = Some(head);
        self
    }
}

/// Produces rendered content for the nodes the diff emits.
pub trait ContentLoader {
    /// Render `node`, located at `path`.
    fn load(
        &self,
        path: &SegmentPath,
        node: &RouterStateTree,
        mode: RenderMode,
    ) -> anyhow::Result<RenderedSlice>;

    /// Whether an otherwise unchanged node must be re-rendered, e.g. after revalidation.
    fn needs_render(&self, _path: &SegmentPath, _node: &RouterStateTree) -> bool {
        false
    }
}

impl<F> ContentLoader for F
where
    F: Fn(&SegmentPath, &RouterStateTree, RenderMode) -> anyhow::Result<RenderedSlice>,
{
    fn load(
        &self,
        path: &SegmentPath,
        node: &RouterStateTree,
        mode: RenderMode,
    ) -> anyhow::Result<RenderedSlice> {
        self(path, node, mode)
    }
}

/// Renders router state into flight responses for one build.
#[derive(Debug, Clone)]
pub struct FlightRenderer<L> {
    options: RenderOptions,
    loader: L,
}

impl<L: ContentLoader> FlightRenderer<L> {
    /// Create a renderer.
    pub fn new(options: RenderOptions, loader: L) -> Self {
        Self { options, loader }
    }

    /// Get the render options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Get the build identifier.
    pub fn build_id(&self) -> &BuildId {
        &self.options.build_id
    }

    /// Render a single data path replacing the whole client tree.
    pub fn render_full(&self, next: &RouterStateTree, mode: RenderMode) -> Result<DataPath> {
        check_limits(next, &self.options.limits)?;
        render_at(Vec::new(), next, &self.loader, mode)
    }

    /// Render the data paths a client holding `prev` needs to reach `next`.
    ///
    /// Without a previous tree the whole tree is rendered.
    pub fn render_paths(
        &self,
        prev: Option<&RouterStateTree>,
        next: &RouterStateTree,
        mode: RenderMode,
    ) -> Result<Vec<DataPath>> {
        check_limits(next, &self.options.limits)?;
        match prev {
            Some(prev) => diff(prev, next, &self.loader, mode),
            None => Ok(vec![render_at(Vec::new(), next, &self.loader, mode)?]),
        }
    }

    /// Render a navigation response.
    pub fn render_navigation(
        &self,
        prev: Option<&RouterStateTree>,
        next: &RouterStateTree,
        mode: RenderMode,
    ) -> Result<NavigationResponse> {
        let paths = self.render_paths(prev, next, mode)?;
        tracing::debug!(
            build_id = %self.options.build_id,
            paths = paths.len(),
            prefetch = mode.is_prefetch(),
            "rendered navigation"
        );
        Ok(NavigationResponse::new(
            self.options.build_id.clone(),
            FlightData::Paths(paths),
        ))
    }

    /// Render a redirect instruction.
    pub fn render_redirect(&self, url: impl Into<String>) -> NavigationResponse {
        NavigationResponse::new(self.options.build_id.clone(), FlightData::Redirect(url.into()))
    }

    /// Render the response to a server action.
    ///
    /// `update` carries the client's previous tree (if known) and the tree
    /// after the action ran; `None` means the action caused no navigation.
    pub fn render_action(
        &self,
        result: ActionResult,
        update: Option<(Option<&RouterStateTree>, &RouterStateTree)>,
    ) -> Result<ActionResponse> {
        let flight_data = match update {
            Some((prev, next)) => Some(FlightData::Paths(self.render_paths(
                prev,
                next,
                RenderMode::Full,
            )?)),
            None => None,
        };
        Ok(ActionResponse::Result {
            action_result: result,
            build_id: self.options.build_id.clone(),
            flight_data,
        })
    }
}
