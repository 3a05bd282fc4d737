use hinge_angle::mock::{MockLayoutSource, MockSensorSource};
use hinge_angle::{FoldState, OpenOptions, init};
use tokio::time::{Duration, sleep};

// Run with: HINGE_ANGLE_LOG=hinge_angle=debug cargo run --example watch
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HINGE_ANGLE_LOG"))
        .init();

    let sensor = MockSensorSource::new();
    let layout = MockLayoutSource::new();
    let (resolver, report) = init(&sensor, &layout, &OpenOptions::from_env()).await;
    println!("sensor={:?} layout={:?}", report.sensor, report.layout);

    let sweep = sensor.sweep(30.0);

    // CI mode: exit after a few seconds
    let ci = std::env::var("HINGE_ANGLE_CI").ok().as_deref() == Some("1");
    let mut tick = 0u32;
    loop {
        // Every few seconds the layout tracker reports a coarse state.
        match tick % 40 {
            10 => layout.push_state(FoldState::HalfOpened),
            30 => layout.push_state(FoldState::Other),
            _ => {}
        }
        let s = resolver.latest();
        println!("{:6.2}°  [{:?}]", s.angle_deg, s.source);

        tick += 1;
        if ci && tick > 40 {
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
    sweep.abort();
    Ok(())
}
