// src/backend_mock.rs
use crate::source::{AngleSensorSource, LayoutStateSource, LayoutStream, SensorStream, SourceInfo};
use crate::types::{Error, FoldState, Result, SensorDelay, SensorEvent, SensorType, WindowLayout};
use futures_util::StreamExt;
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{self, Duration},
};
use tokio_stream::wrappers::BroadcastStream;

/// In-memory sensor service. Events pushed here reach every registered
/// listener; a listener is unregistered when its stream is dropped.
#[derive(Clone)]
pub struct MockSensorSource {
    present: bool,
    tx: broadcast::Sender<SensorEvent>,
}

impl MockSensorSource {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel::<SensorEvent>(256);
        Self { present: true, tx }
    }

    /// A sensor service that reports no hinge angle sensor.
    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::new()
        }
    }

    pub fn push(&self, event: SensorEvent) {
        let _ = self.tx.send(event);
    }

    pub fn push_angle(&self, angle_deg: f32) {
        self.push(SensorEvent::hinge(angle_deg));
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Drive a slow open/close motion between ~20° and ~170°.
    pub fn sweep(&self, hz: f32) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let target_hz = if hz.is_finite() && hz > 0.0 { hz } else { 30.0 };
        tokio::spawn(async move {
            let mut t = 0.0f32;
            // Very high rates round to a zero period, which `interval` rejects.
            let period = Duration::from_secs_f32(1.0 / target_hz).max(Duration::from_millis(1));
            let mut interval = time::interval(period);
            loop {
                interval.tick().await;
                t += 0.04;
                let angle = 95.0 + 75.0 * t.sin() + 0.5 * (3.7 * t).sin();
                let _ = tx.send(SensorEvent::hinge(angle));
            }
        })
    }
}

impl Default for MockSensorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AngleSensorSource for MockSensorSource {
    fn has_sensor(&self, kind: SensorType) -> bool {
        self.present && kind == SensorType::HINGE_ANGLE
    }

    // Delivers every pushed event regardless of type; filtering is the listener's job.
    fn register(&self, kind: SensorType, _delay: SensorDelay) -> Result<SensorStream> {
        if !self.has_sensor(kind) {
            return Err(Error::Unsupported(format!("mock: no sensor of type {}", kind.0)));
        }
        Ok(BroadcastStream::new(self.tx.subscribe())
            .filter_map(|it| async move { it.ok() }) // drop lag/closed errors
            .boxed())
    }

    fn info(&self) -> SourceInfo {
        SourceInfo { note: "mock" }
    }
}

/// In-memory window-layout tracker.
#[derive(Clone)]
pub struct MockLayoutSource {
    failing: bool,
    tx: broadcast::Sender<WindowLayout>,
}

impl MockLayoutSource {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel::<WindowLayout>(64);
        Self { failing: false, tx }
    }

    /// A tracker whose subscription fails during setup.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn push(&self, layout: WindowLayout) {
        let _ = self.tx.send(layout);
    }

    pub fn push_state(&self, state: FoldState) {
        self.push(WindowLayout::folded(state));
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for MockLayoutSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutStateSource for MockLayoutSource {
    fn subscribe(&self) -> Result<LayoutStream> {
        if self.failing {
            return Err(Error::Backend("mock: window layout tracker unavailable".into()));
        }
        Ok(BroadcastStream::new(self.tx.subscribe())
            .filter_map(|it| async move { it.ok() })
            .boxed())
    }

    fn info(&self) -> SourceInfo {
        SourceInfo { note: "mock" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn registered_listener_sees_pushed_events() {
        let src = MockSensorSource::new();
        let mut s = src.register(SensorType::HINGE_ANGLE, SensorDelay::Normal).unwrap();
        assert_eq!(src.listener_count(), 1);
        src.push_angle(12.0);
        let ev = s.next().await.unwrap();
        assert_eq!(ev.values, vec![12.0]);
        drop(s);
        assert_eq!(src.listener_count(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sweep_survives_extreme_rates() {
        let src = MockSensorSource::new();
        let mut s = src.register(SensorType::HINGE_ANGLE, SensorDelay::Fastest).unwrap();
        let sweep = src.sweep(1e12);
        let ev = tokio::time::timeout(Duration::from_millis(500), s.next())
            .await
            .expect("no timeout")
            .expect("stream ended unexpectedly");
        assert_eq!(ev.sensor_type, SensorType::HINGE_ANGLE);
        assert!(!sweep.is_finished());
        sweep.abort();
        assert!(sweep.await.unwrap_err().is_cancelled());
    }

    #[test]
    fn absent_sensor_refuses_registration() {
        let src = MockSensorSource::absent();
        assert!(!src.has_sensor(SensorType::HINGE_ANGLE));
        assert!(src.register(SensorType::HINGE_ANGLE, SensorDelay::Normal).is_err());
    }

    #[test]
    fn failing_layout_refuses_subscription() {
        assert!(MockLayoutSource::failing().subscribe().is_err());
        assert!(MockLayoutSource::new().subscribe().is_ok());
    }
}
