//! Method-call boundary for the application layer.
//!
//! Calls arrive either as [`MethodCall`] values or as JSON bytes using the
//! usual method-codec envelopes:
//! - request: `{"method": "getHingeAngle", "args": null}`
//! - success: `[result]`
//! - error: `[code, message, details]`
//! - not implemented: empty reply

use crate::OpenOptions;
use crate::resolver::HingeAngleResolver;
use crate::types::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

pub const DEFAULT_CHANNEL: &str = "hinge_detector";
pub const GET_HINGE_ANGLE: &str = "getHingeAngle";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Value::Null,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Error {
        code: String,
        message: String,
        details: Value,
    },
    NotImplemented,
}

impl MethodResponse {
    /// Encode as a reply envelope. Not-implemented is an empty reply.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            MethodResponse::Success(v) => serde_json::to_vec(&json!([v]))?,
            MethodResponse::Error {
                code,
                message,
                details,
            } => serde_json::to_vec(&json!([code, message, details]))?,
            MethodResponse::NotImplemented => Vec::new(),
        };
        Ok(bytes)
    }
}

/// JSON numbers cannot hold NaN or infinities, so a non-finite reading is
/// answered with an `invalid_angle` error whose details carry the value as text.
fn angle_response(angle: f32) -> MethodResponse {
    if angle.is_finite() {
        return MethodResponse::Success(json!(angle));
    }
    MethodResponse::Error {
        code: "invalid_angle".into(),
        message: "hinge angle is not a finite number".into(),
        details: json!(angle.to_string()),
    }
}

pub struct HingeChannel {
    name: String,
    resolver: Arc<HingeAngleResolver>,
}

impl HingeChannel {
    pub fn new(resolver: Arc<HingeAngleResolver>) -> Self {
        Self::named(DEFAULT_CHANNEL, resolver)
    }

    /// Channel named after `opts.channel`.
    pub fn from_options(opts: &OpenOptions, resolver: Arc<HingeAngleResolver>) -> Self {
        Self::named(opts.channel.clone(), resolver)
    }

    pub fn named(name: impl Into<String>, resolver: Arc<HingeAngleResolver>) -> Self {
        Self {
            name: name.into(),
            resolver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self, call: &MethodCall) -> MethodResponse {
        match call.method.as_str() {
            GET_HINGE_ANGLE => angle_response(self.resolver.query()),
            other => {
                tracing::trace!(channel = %self.name, method = other, "method not implemented");
                MethodResponse::NotImplemented
            }
        }
    }

    /// Decode a JSON request, dispatch it and encode the reply. Malformed
    /// requests are answered with a `bad_request` error envelope.
    pub fn handle_bytes(&self, request: &[u8]) -> Result<Vec<u8>> {
        let response = match serde_json::from_slice::<MethodCall>(request) {
            Ok(call) => self.handle(&call),
            Err(e) => MethodResponse::Error {
                code: "bad_request".into(),
                message: e.to_string(),
                details: Value::Null,
            },
        };
        response.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FoldState, SensorEvent};

    fn channel() -> (Arc<HingeAngleResolver>, HingeChannel) {
        let resolver = Arc::new(HingeAngleResolver::detached(&OpenOptions::default()));
        let ch = HingeChannel::new(Arc::clone(&resolver));
        (resolver, ch)
    }

    #[test]
    fn get_hinge_angle_reads_current_value() {
        let (resolver, ch) = channel();
        assert_eq!(ch.name(), "hinge_detector");
        let renamed = HingeChannel::from_options(
            &OpenOptions::new().channel("foldable"),
            Arc::clone(&resolver),
        );
        assert_eq!(renamed.name(), "foldable");
        assert_eq!(
            ch.handle(&MethodCall::new(GET_HINGE_ANGLE)),
            MethodResponse::Success(json!(0.0))
        );
        resolver.on_sensor_event(&SensorEvent::hinge(72.5));
        assert_eq!(
            ch.handle(&MethodCall::new(GET_HINGE_ANGLE)),
            MethodResponse::Success(json!(72.5))
        );
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let (_resolver, ch) = channel();
        assert_eq!(
            ch.handle(&MethodCall::new("getBatteryLevel")),
            MethodResponse::NotImplemented
        );
        let reply = ch.handle_bytes(br#"{"method":"getBatteryLevel"}"#).unwrap();
        assert!(reply.is_empty());
    }

    #[test]
    fn json_round_trip_through_envelope() {
        let (resolver, ch) = channel();
        resolver.on_fold_state(FoldState::Flat);
        let reply = ch
            .handle_bytes(br#"{"method":"getHingeAngle","args":null}"#)
            .unwrap();
        let v: Value = serde_json::from_slice(&reply).unwrap();
        assert_eq!(v, json!([180.0]));
    }

    #[test]
    fn non_finite_angle_is_reported_as_invalid() {
        let (resolver, ch) = channel();
        resolver.on_sensor_event(&SensorEvent::hinge(f32::NAN));
        assert!(resolver.query().is_nan());
        let reply = ch.handle_bytes(br#"{"method":"getHingeAngle"}"#).unwrap();
        let v: Value = serde_json::from_slice(&reply).unwrap();
        assert_eq!(v, json!(["invalid_angle", "hinge angle is not a finite number", "NaN"]));

        resolver.on_sensor_event(&SensorEvent::hinge(f32::INFINITY));
        match ch.handle(&MethodCall::new(GET_HINGE_ANGLE)) {
            MethodResponse::Error { code, details, .. } => {
                assert_eq!(code, "invalid_angle");
                assert_eq!(details, json!("inf"));
            }
            other => panic!("unexpected response: {other:?}"),
        }

        // Out-of-range but finite readings still pass through as numbers.
        resolver.on_sensor_event(&SensorEvent::hinge(-400.0));
        assert_eq!(
            ch.handle(&MethodCall::new(GET_HINGE_ANGLE)),
            MethodResponse::Success(json!(-400.0))
        );
    }

    #[test]
    fn malformed_request_gets_error_envelope() {
        let (_resolver, ch) = channel();
        let reply = ch.handle_bytes(b"not json").unwrap();
        let v: Value = serde_json::from_slice(&reply).unwrap();
        assert_eq!(v[0], json!("bad_request"));
        assert!(v[1].is_string());
        assert!(v[2].is_null());
    }
}
