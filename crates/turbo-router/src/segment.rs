//! Route segments: the atomic addressing unit of a router state tree.
//!
//! On the wire a segment is either a plain string (a static path segment)
//! or a `[name, value, kind]` triple for dynamic parameters:
//!
//! ```text
//! "dashboard"            -> Segment::Static("dashboard")
//! ["id", "42", "d"]      -> Segment::Param { name: "id", value: "42", kind: Dynamic }
//! ["slug", "a/b", "c"]   -> Segment::Param { .., kind: CatchAll }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{type_name, Result, RouterStateError};

/// Reserved static segment for the leaf page of a route.
pub const PAGE_SEGMENT: &str = "__PAGE__";

/// Kind of a dynamic route parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DynamicParamKind {
    /// `[id]` - exactly one path segment.
    Dynamic,
    /// `[[...slug]]` - zero or more path segments.
    OptionalCatchAll,
    /// `[...slug]` - one or more path segments.
    CatchAll,
}

impl DynamicParamKind {
    /// All kinds, in wire-code order.
    pub const ALL: [DynamicParamKind; 3] = [Self::Dynamic, Self::OptionalCatchAll, Self::CatchAll];

    /// Short wire code (`d`, `oc`, `c`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Dynamic => "d",
            Self::OptionalCatchAll => "oc",
            Self::CatchAll => "c",
        }
    }

    /// Long descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dynamic => "dynamic",
            Self::OptionalCatchAll => "optional-catchall",
            Self::CatchAll => "catchall",
        }
    }

    /// Check if this kind can match more than one path segment.
    pub fn is_catch_all(&self) -> bool {
        !matches!(self, Self::Dynamic)
    }
}

impl FromStr for DynamicParamKind {
    type Err = RouterStateError;

    fn from_str(code: &str) -> Result<Self> {
        match code {
            "d" => Ok(Self::Dynamic),
            "oc" => Ok(Self::OptionalCatchAll),
            "c" => Ok(Self::CatchAll),
            other => Err(RouterStateError::InvalidSegmentKind(other.to_string())),
        }
    }
}

impl fmt::Display for DynamicParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One level of a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A static path segment.
    Static(String),
    /// A dynamic parameter with its resolved value.
    Param {
        name: String,
        value: String,
        kind: DynamicParamKind,
    },
}

impl Segment {
    /// Create a static segment.
    pub fn new(name: impl Into<String>) -> Self {
        Self::Static(name.into())
    }

    /// Create a `dynamic` parameter segment.
    pub fn dynamic(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::param(name, value, DynamicParamKind::Dynamic)
    }

    /// Create a `catchall` parameter segment.
    pub fn catch_all(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::param(name, value, DynamicParamKind::CatchAll)
    }

    /// Create an `optional-catchall` parameter segment.
    pub fn optional_catch_all(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::param(name, value, DynamicParamKind::OptionalCatchAll)
    }

    /// Create a parameter segment of the given kind.
    pub fn param(
        name: impl Into<String>,
        value: impl Into<String>,
        kind: DynamicParamKind,
    ) -> Self {
        Self::Param {
            name: name.into(),
            value: value.into(),
            kind,
        }
    }

    /// The leaf page segment.
    pub fn page() -> Self {
        Self::Static(PAGE_SEGMENT.to_string())
    }

    /// Get the parameter triple, if this is a parameter segment.
    pub fn param_parts(&self) -> Option<(&str, &str, DynamicParamKind)> {
        match self {
            Self::Static(_) => None,
            Self::Param { name, value, kind } => Some((name, value, *kind)),
        }
    }

    /// Get the static name, if this is a static segment.
    pub fn as_static(&self) -> Option<&str> {
        match self {
            Self::Static(name) => Some(name),
            Self::Param { .. } => None,
        }
    }

    /// Check if this is a parameter segment.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Param { .. })
    }

    /// Check if this is the reserved page segment.
    pub fn is_page(&self) -> bool {
        self.as_static() == Some(PAGE_SEGMENT)
    }

    /// Check if this is a route group such as `(marketing)`.
    pub fn is_route_group(&self) -> bool {
        self.as_static()
            .is_some_and(|s| s.len() > 2 && s.starts_with('(') && s.ends_with(')'))
    }

    /// Check whether two segments address the same route level.
    ///
    /// Parameter segments match on name and value; the kind is not compared.
    pub fn matches(&self, other: &Segment) -> bool {
        match (self, other) {
            (Self::Static(a), Self::Static(b)) => a == b,
            (
                Self::Param { name, value, .. },
                Self::Param {
                    name: other_name,
                    value: other_value,
                    ..
                },
            ) => name == other_name && value == other_value,
            _ => false,
        }
    }

    /// Decode a segment from its wire value.
    pub fn decode(value: &Value) -> Result<Self> {
        Self::decode_at(value, "")
    }

    pub(crate) fn decode_at(value: &Value, at: &str) -> Result<Self> {
        match value {
            Value::String(name) => Ok(Self::Static(name.clone())),
            Value::Array(items) => {
                let [name, param_value, kind] = items.as_slice() else {
                    return Err(RouterStateError::schema(
                        at,
                        format!("segment tuple must have 3 elements, got {}", items.len()),
                    ));
                };
                let name = expect_str(name, &format!("{at}/0"))?;
                let param_value = expect_str(param_value, &format!("{at}/1"))?;
                let kind = expect_str(kind, &format!("{at}/2"))?.parse()?;
                Ok(Self::param(name, param_value, kind))
            }
            other => Err(RouterStateError::schema(
                at,
                format!("expected string or segment tuple, got {}", type_name(other)),
            )),
        }
    }

    /// Encode the segment to its wire value.
    pub fn encode(&self) -> Value {
        match self {
            Self::Static(name) => Value::String(name.clone()),
            Self::Param { name, value, kind } => Value::Array(vec![
                Value::String(name.clone()),
                Value::String(value.clone()),
                Value::String(kind.code().to_string()),
            ]),
        }
    }
}

fn expect_str<'a>(value: &'a Value, at: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        RouterStateError::schema(at, format!("expected string, got {}", type_name(value)))
    })
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(name) => write!(f, "{}", name),
            Self::Param { name, value, kind } => write!(f, "[{}={}:{}]", name, value, kind.code()),
        }
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Self::Static(name.to_string())
    }
}

impl From<String> for Segment {
    fn from(name: String) -> Self {
        Self::Static(name)
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.encode().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Segment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode(&value).map_err(D::Error::custom)
    }
}
