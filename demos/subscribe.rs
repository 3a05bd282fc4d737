use futures_util::StreamExt;
use hinge_angle::init;
use hinge_angle::mock::{MockLayoutSource, MockSensorSource};

#[tokio::main]
async fn main() -> hinge_angle::Result<()> {
    let sensor = MockSensorSource::new();
    let (resolver, _report) = init(&sensor, &MockLayoutSource::new(), &Default::default()).await;
    let _sweep = sensor.sweep(60.0);

    let mut stream = resolver.subscribe();
    println!("Streaming via subscribe()");
    let mut n = 0u32;
    while let Some(s) = stream.next().await {
        if n % 15 == 0 {
            println!("{:6.2}°  [{:?}] @ {:?}", s.angle_deg, s.source, s.timestamp);
        }
        n += 1;
    }
    Ok(())
}
