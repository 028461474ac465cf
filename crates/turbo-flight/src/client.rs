//! Client-side reading of flight responses.

use std::sync::Arc;

use serde_json::Value;
use turbo_router::{RouterStateTree, TreeLimits};

use crate::envelope::{parse_envelope_with, BuildId, Envelope, EnvelopeContext};
use crate::error::{FlightError, Result};
use crate::patch::{apply_flight_data, Navigation};

/// Parses envelopes for the build the client is running.
#[derive(Debug, Clone)]
pub struct ResponseReader {
    build_id: BuildId,
    limits: TreeLimits,
}

impl ResponseReader {
    /// Create a reader for the loaded build.
    pub fn new(build_id: impl Into<BuildId>) -> Self {
        Self {
            build_id: build_id.into(),
            limits: TreeLimits::permissive(),
        }
    }

    /// Set tree limits applied while decoding.
    pub fn with_limits(mut self, limits: TreeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Build identifier of the running client.
    pub fn build_id(&self) -> &BuildId {
        &self.build_id
    }

    /// Parse a raw envelope and check that it comes from the running build.
    pub fn read(&self, raw: &Value, context: EnvelopeContext) -> Result<Envelope> {
        let envelope = parse_envelope_with(raw, context, &self.limits)?;
        if envelope.build_id() != &self.build_id {
            tracing::warn!(
                expected = %self.build_id,
                received = %envelope.build_id(),
                "stale build, reload required"
            );
            return Err(FlightError::StaleBuild {
                expected: self.build_id.to_string(),
                received: envelope.build_id().to_string(),
            });
        }
        Ok(envelope)
    }

    /// Parse a JSON text envelope.
    pub fn read_str(&self, text: &str, context: EnvelopeContext) -> Result<Envelope> {
        let raw: Value = serde_json::from_str(text)?;
        self.read(&raw, context)
    }

    /// Read an envelope and apply its flight data to the client tree.
    ///
    /// Returns `None` when the envelope carries no navigational update.
    pub fn navigate(
        &self,
        base: &Arc<RouterStateTree>,
        raw: &Value,
        context: EnvelopeContext,
    ) -> Result<Option<Navigation>> {
        let envelope = self.read(raw, context)?;
        envelope
            .flight_data()
            .map(|data| apply_flight_data(base, data))
            .transpose()
    }
}
