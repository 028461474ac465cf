//! Top-level response envelopes.
//!
//! ```text
//! navigation: [buildId, FlightData]
//! action:     [actionResult, [buildId, FlightData | null]]
//!           | [buildId, FlightData]          (e.g. redirect() inside an action)
//! ```
//!
//! Both action shapes are 2-tuples. They are told apart by the type of the
//! first element: a string means the navigation form, anything else means
//! the action-result form.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use turbo_router::TreeLimits;

use crate::data_path::FlightData;
use crate::error::{FlightError, Result};

/// Identifier of the build that produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(String);

impl BuildId {
    /// Create a build ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BuildId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BuildId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for BuildId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque value returned by a server action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionResult(pub Value);

/// Which endpoint produced the raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeContext {
    /// Regular navigation or prefetch.
    Navigation,
    /// Server action invocation.
    Action,
}

/// Response to a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationResponse {
    pub build_id: BuildId,
    pub flight_data: FlightData,
}

impl NavigationResponse {
    /// Create a navigation response.
    pub fn new(build_id: impl Into<BuildId>, flight_data: FlightData) -> Self {
        Self {
            build_id: build_id.into(),
            flight_data,
        }
    }

    /// Encode to the wire value.
    pub fn encode(&self) -> Value {
        Value::Array(vec![
            Value::String(self.build_id.to_string()),
            self.flight_data.encode(),
        ])
    }
}

/// Response to a server action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResponse {
    /// The action ran; `flight_data` is `None` when it caused no navigation.
    Result {
        action_result: ActionResult,
        build_id: BuildId,
        flight_data: Option<FlightData>,
    },
    /// The action answered with a plain navigation, e.g. after `redirect()`.
    Navigation(NavigationResponse),
}

impl ActionResponse {
    /// Build identifier carried by either shape.
    pub fn build_id(&self) -> &BuildId {
        match self {
            ActionResponse::Result { build_id, .. } => build_id,
            ActionResponse::Navigation(nav) => &nav.build_id,
        }
    }

    /// Flight data carried by either shape, if any.
    pub fn flight_data(&self) -> Option<&FlightData> {
        match self {
            ActionResponse::Result { flight_data, .. } => flight_data.as_ref(),
            ActionResponse::Navigation(nav) => Some(&nav.flight_data),
        }
    }

    /// Encode to the wire value.
    pub fn encode(&self) -> Value {
        match self {
            ActionResponse::Result {
                action_result,
                build_id,
                flight_data,
            } => Value::Array(vec![
                action_result.0.clone(),
                Value::Array(vec![
                    Value::String(build_id.to_string()),
                    flight_data.as_ref().map(FlightData::encode).unwrap_or(Value::Null),
                ]),
            ]),
            ActionResponse::Navigation(nav) => nav.encode(),
        }
    }
}

/// A decoded envelope of either context.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Navigation(NavigationResponse),
    Action(ActionResponse),
}

impl Envelope {
    /// Build identifier of the envelope.
    pub fn build_id(&self) -> &BuildId {
        match self {
            Envelope::Navigation(nav) => &nav.build_id,
            Envelope::Action(action) => action.build_id(),
        }
    }

    /// Flight data of the envelope, if any.
    pub fn flight_data(&self) -> Option<&FlightData> {
        match self {
            Envelope::Navigation(nav) => Some(&nav.flight_data),
            Envelope::Action(action) => action.flight_data(),
        }
    }

    /// Encode to the wire value.
    pub fn encode(&self) -> Value {
        match self {
            Envelope::Navigation(nav) => nav.encode(),
            Envelope::Action(action) => action.encode(),
        }
    }
}

/// Parse a raw envelope without structural tree limits.
pub fn parse_envelope(raw: &Value, context: EnvelopeContext) -> Result<Envelope> {
    parse_envelope_with(raw, context, &TreeLimits::permissive())
}

/// Parse a raw envelope against the given tree limits.
pub fn parse_envelope_with(
    raw: &Value,
    context: EnvelopeContext,
    limits: &TreeLimits,
) -> Result<Envelope> {
    let (first, second) = pair(raw, "")?;
    match context {
        EnvelopeContext::Navigation => {
            parse_navigation(first, second, limits).map(Envelope::Navigation)
        }
        EnvelopeContext::Action => parse_action(first, second, limits).map(Envelope::Action),
    }
}

fn pair<'a>(raw: &'a Value, at: &str) -> Result<(&'a Value, &'a Value)> {
    match raw.as_array().map(Vec::as_slice) {
        Some([first, second]) => Ok((first, second)),
        Some(items) => Err(FlightError::schema(
            at,
            format!("envelope must be a 2-tuple, got {} elements", items.len()),
        )),
        None => Err(FlightError::schema(at, "envelope must be an array")),
    }
}

fn parse_navigation(first: &Value, second: &Value, limits: &TreeLimits) -> Result<NavigationResponse> {
    let build_id = first
        .as_str()
        .ok_or_else(|| FlightError::schema("/0", "build id must be a string"))?;
    Ok(NavigationResponse::new(
        build_id,
        FlightData::decode_with(second, limits)?,
    ))
}

fn parse_action(first: &Value, second: &Value, limits: &TreeLimits) -> Result<ActionResponse> {
    if first.is_string() {
        return match parse_navigation(first, second, limits) {
            Ok(nav) => Ok(ActionResponse::Navigation(nav)),
            // A string-valued action result paired with [buildId, data] reads
            // as neither shape with certainty.
            Err(err) if looks_like_action_payload(second) => {
                Err(FlightError::AmbiguousEnvelopeShape(format!(
                    "string first element but second element is not flight data ({})",
                    err
                )))
            }
            Err(err) => Err(err),
        };
    }

    let (build_id, flight_data) = pair(second, "/1")?;
    let build_id = build_id.as_str().ok_or_else(|| {
        FlightError::AmbiguousEnvelopeShape(
            "neither element is a build id; expected [actionResult, [buildId, data]]".to_string(),
        )
    })?;
    let flight_data = match flight_data {
        Value::Null => None,
        data => Some(FlightData::decode_with(data, limits)?),
    };
    Ok(ActionResponse::Result {
        action_result: ActionResult(first.clone()),
        build_id: BuildId::new(build_id),
        flight_data,
    })
}

fn looks_like_action_payload(value: &Value) -> bool {
    matches!(value.as_array().map(Vec::as_slice), Some([Value::String(_), _]))
}
