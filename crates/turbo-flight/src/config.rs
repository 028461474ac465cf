//! Render options supplied per build and per request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use turbo_router::TreeLimits;

use crate::envelope::BuildId;
use crate::error::Result;

/// Runtime the server renders in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerRuntime {
    #[default]
    Nodejs,
    Edge,
}

/// Build output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Standalone,
    Export,
}

/// Request body limit for server actions: a byte count or a size string such as `"2mb"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BodySizeLimit {
    Bytes(u64),
    Size(String),
}

/// Options for rendering flight responses.
///
/// The manifests are opaque: they are passed through to the content layer
/// and never inspected by tree or patch logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Build identifier echoed in every envelope.
    pub build_id: BuildId,
    /// Base path the app is mounted under.
    #[serde(default)]
    pub base_path: String,
    /// Prefix for static asset URLs.
    #[serde(default)]
    pub asset_prefix: String,
    /// Development mode.
    #[serde(default)]
    pub dev: bool,
    #[serde(default = "default_true")]
    pub supports_dynamic_html: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_revalidate: bool,
    #[serde(default)]
    pub is_draft_mode: bool,
    /// Rendering for a static export.
    #[serde(default)]
    pub next_export: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    /// Pathname before rewrites were applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_pathname: Option<String>,
    #[serde(default)]
    pub runtime: ServerRuntime,
    #[serde(default, alias = "nextConfigOutput", skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputMode>,
    /// Passed through to the action handler; never enforced here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_actions_body_size_limit: Option<BodySizeLimit>,
    /// Resolved route parameters.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_reference_manifest: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_manifest: Option<Value>,
    /// Limits enforced on trees before they are sent.
    #[serde(default)]
    pub limits: TreeLimits,
}

fn default_true() -> bool {
    true
}

impl RenderOptions {
    /// Create options for the given build with defaults for everything else.
    pub fn new(build_id: impl Into<BuildId>) -> Self {
        Self {
            build_id: build_id.into(),
            base_path: String::new(),
            asset_prefix: String::new(),
            dev: false,
            supports_dynamic_html: true,
            is_bot: false,
            is_revalidate: false,
            is_draft_mode: false,
            next_export: false,
            deployment_id: None,
            original_pathname: None,
            runtime: ServerRuntime::default(),
            output: None,
            server_actions_body_size_limit: None,
            params: BTreeMap::new(),
            client_reference_manifest: None,
            font_manifest: None,
            limits: TreeLimits::default(),
        }
    }

    /// Load options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the base path.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Set the asset prefix.
    pub fn with_asset_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.asset_prefix = prefix.into();
        self
    }

    /// Set tree limits.
    pub fn with_limits(mut self, limits: TreeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Add a route parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Mark the render as a revalidation.
    pub fn revalidating(mut self) -> Self {
        self.is_revalidate = true;
        self
    }

    /// Enable development mode.
    pub fn dev(mut self) -> Self {
        self.dev = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_defaults() {
        let options = RenderOptions::from_json(r#"{"buildId": "b1"}"#).unwrap();
        assert_eq!(options, RenderOptions::new("b1"));
        assert!(options.supports_dynamic_html);
    }

    #[test]
    fn test_from_json_full() {
        let options = RenderOptions::from_json(
            r#"{
                "buildId": "b2",
                "basePath": "/shop",
                "runtime": "edge",
                "output": "standalone",
                "params": {"id": "42"},
                "clientReferenceManifest": {"ssrModuleMapping": {}},
                "limits": {"maxDepth": 8, "allowedSlots": ["children", "modal"]}
            }"#,
        )
        .unwrap();
        assert_eq!(options.base_path, "/shop");
        assert_eq!(options.runtime, ServerRuntime::Edge);
        assert_eq!(options.output, Some(OutputMode::Standalone));
        assert_eq!(options.params.get("id").map(String::as_str), Some("42"));
        assert_eq!(options.limits.max_depth, 8);
        assert!(options.limits.allows_slot("modal"));
        assert!(!options.limits.allows_slot("sidebar"));
    }

    #[test]
    fn test_from_json_action_and_export_options() {
        let options = RenderOptions::from_json(
            r#"{
                "buildId": "b4",
                "nextExport": true,
                "nextConfigOutput": "export",
                "serverActionsBodySizeLimit": "2mb"
            }"#,
        )
        .unwrap();
        assert!(options.next_export);
        assert_eq!(options.output, Some(OutputMode::Export));
        assert_eq!(
            options.server_actions_body_size_limit,
            Some(BodySizeLimit::Size("2mb".to_string()))
        );

        let options =
            RenderOptions::from_json(r#"{"buildId": "b5", "serverActionsBodySizeLimit": 1048576}"#).unwrap();
        assert_eq!(options.server_actions_body_size_limit, Some(BodySizeLimit::Bytes(1_048_576)));
    }

    #[test]
    fn test_from_json_requires_build_id() {
        assert!(RenderOptions::from_json(r#"{"basePath": "/"}"#).is_err());
    }

    #[test]
    fn test_builder() {
        let options = RenderOptions::new("b3")
            .with_base_path("/docs")
            .with_param("slug", "intro")
            .revalidating()
            .dev();
        assert!(options.dev);
        assert!(options.is_revalidate);
        assert_eq!(options.base_path, "/docs");
    }
}
