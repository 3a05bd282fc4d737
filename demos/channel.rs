use hinge_angle::mock::{MockLayoutSource, MockSensorSource};
use hinge_angle::{FoldState, HingeChannel, OpenOptions, init};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sensor = MockSensorSource::absent();
    let layout = MockLayoutSource::new();
    let opts = OpenOptions::new();
    let (resolver, _report) = init(&sensor, &layout, &opts).await;
    let ch = HingeChannel::from_options(&opts, Arc::new(resolver));

    let requests: [&[u8]; 3] = [
        br#"{"method":"getHingeAngle"}"#,
        br#"{"method":"getBatteryLevel"}"#,
        b"{oops",
    ];
    for state in [FoldState::HalfOpened, FoldState::Flat] {
        layout.push_state(state);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        for req in requests {
            let reply = ch.handle_bytes(req)?;
            println!(
                "{} <- {} : {}",
                ch.name(),
                String::from_utf8_lossy(req),
                String::from_utf8_lossy(&reply)
            );
        }
    }
    Ok(())
}
