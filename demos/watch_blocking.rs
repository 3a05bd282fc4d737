use hinge_angle::mock::{MockLayoutSource, MockSensorSource};
use hinge_angle::{OpenOptions, init_blocking};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sensor = MockSensorSource::new();
    let opts = OpenOptions::new().layout(false);
    let (resolver, report) = init_blocking(&sensor, &MockLayoutSource::new(), &opts);
    println!("Polling (blocking)… Ctrl-C to exit, sensor={:?}", report.sensor);

    // The feed task runs on the library's global runtime.
    let mut angle = 0.0f32;
    loop {
        angle = (angle + 7.5) % 180.0;
        sensor.push_angle(angle);
        println!("{:6.2}°", resolver.query());
        std::thread::sleep(std::time::Duration::from_millis(200));
    }
}
