#![cfg(feature = "mock")]

use hinge_angle::channel::GET_HINGE_ANGLE;
use hinge_angle::mock::{MockLayoutSource, MockSensorSource};
use hinge_angle::{FoldState, HingeChannel, MethodCall, MethodResponse, OpenOptions, init};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::time::{Duration, sleep};

#[tokio::test(flavor = "current_thread")]
async fn channel_reports_live_feed_value() {
    let sensor = MockSensorSource::new();
    let layout = MockLayoutSource::new();
    let opts = OpenOptions::new().channel("hinge_detector");
    let (resolver, _report) = init(&sensor, &layout, &opts).await;
    let ch = HingeChannel::from_options(&opts, Arc::new(resolver));

    layout.push_state(FoldState::HalfOpened);
    let mut reply = Vec::new();
    for _ in 0..200 {
        reply = ch
            .handle_bytes(br#"{"method":"getHingeAngle"}"#)
            .expect("encode");
        if serde_json::from_slice::<Value>(&reply).expect("json") == json!([90.0]) {
            break;
        }
        sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(serde_json::from_slice::<Value>(&reply).unwrap(), json!([90.0]));

    assert_eq!(
        ch.handle(&MethodCall::new("setHingeAngle")),
        MethodResponse::NotImplemented
    );
    assert_eq!(
        ch.handle(&MethodCall::new(GET_HINGE_ANGLE)),
        MethodResponse::Success(json!(90.0))
    );
}
