//! The hinge angle state cell and the tasks that feed it.

use crate::policy;
use crate::source::{AngleSensorSource, LayoutStateSource};
use crate::types::{AngleSample, FeedStatus, FoldState, SensorEvent, SensorType, Source, WindowLayout};
use crate::{AngleStream, OpenOptions};
use futures_util::StreamExt;
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};
use tokio::{
    sync::{broadcast, watch},
    task::AbortHandle,
};
use tokio_stream::wrappers::BroadcastStream;

/// Lifetime of the component that owns the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Started,
    /// Layout collection is suspended until started again.
    Stopped,
    /// Both feeds are released. Terminal.
    Destroyed,
}

#[derive(Debug, Clone)]
pub struct SetupReport {
    pub sensor: FeedStatus,
    pub layout: FeedStatus,
    pub duration: Duration,
}

#[derive(Clone, Copy, Debug)]
struct HingeState {
    angle_deg: f32,
    source: Option<Source>,
    timestamp: Instant,
}

impl HingeState {
    fn sample(&self) -> AngleSample {
        AngleSample {
            angle_deg: self.angle_deg,
            timestamp: self.timestamp,
            source: self.source,
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single writer for both feeds. Each write and its broadcast happen under
/// one lock, so subscribers see updates in write order.
struct HingeCell {
    state: Mutex<HingeState>,
    tx: broadcast::Sender<AngleSample>,
}

impl HingeCell {
    fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<AngleSample>(capacity.max(1));
        Self {
            state: Mutex::new(HingeState {
                angle_deg: 0.0,
                source: None,
                timestamp: Instant::now(),
            }),
            tx,
        }
    }

    fn write(&self, angle_deg: f32, source: Source) {
        let mut st = lock(&self.state);
        st.angle_deg = angle_deg;
        st.source = Some(source);
        st.timestamp = Instant::now();
        let _ = self.tx.send(st.sample());
    }

    fn sensor_event(&self, event: &SensorEvent) {
        match policy::sensor_angle(event) {
            Some(angle) => self.write(angle, Source::HingeSensor),
            None => tracing::trace!(sensor_type = event.sensor_type.0, "sensor event ignored"),
        }
    }

    fn fold_state(&self, state: FoldState) {
        if let Some(angle) = policy::fold_angle(state) {
            self.write(angle, Source::FoldingFeature);
        }
    }

    fn layout(&self, layout: &WindowLayout) {
        match policy::first_fold(layout) {
            Some(fold) => self.fold_state(fold.state),
            None => tracing::trace!(
                features = layout.display_features.len(),
                "layout without folding feature"
            ),
        }
    }

    fn sample(&self) -> AngleSample {
        lock(&self.state).sample()
    }
}

pub struct HingeAngleResolver {
    cell: Arc<HingeCell>,
    lifecycle: watch::Sender<Lifecycle>,
    sensor_status: FeedStatus,
    layout_status: FeedStatus,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl HingeAngleResolver {
    /// Resolver with no feeds attached. Events can still be pushed through
    /// `on_sensor_event` / `on_layout`.
    pub fn detached(opts: &OpenOptions) -> Self {
        let (lifecycle, _rx) = watch::channel(Lifecycle::Started);
        Self {
            cell: Arc::new(HingeCell::new(opts.capacity)),
            lifecycle,
            sensor_status: FeedStatus::Unavailable("detached".into()),
            layout_status: FeedStatus::Unavailable("detached".into()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Attach both feeds, best effort. Must run inside a Tokio runtime.
    /// A feed that cannot be set up is recorded as unavailable; this never fails.
    pub fn start(
        sensor: &dyn AngleSensorSource,
        layout: &dyn LayoutStateSource,
        opts: &OpenOptions,
    ) -> (Self, SetupReport) {
        let t0 = Instant::now();
        let mut this = Self::detached(opts);

        this.sensor_status = if opts.sensor {
            this.attach_sensor(sensor, opts)
        } else {
            FeedStatus::Unavailable("disabled".into())
        };
        this.layout_status = if opts.layout {
            this.attach_layout(layout)
        } else {
            FeedStatus::Unavailable("disabled".into())
        };

        tracing::debug!(
            sensor = ?this.sensor_status,
            sensor_backend = sensor.info().note,
            layout = ?this.layout_status,
            layout_backend = layout.info().note,
            "hinge angle feeds attached"
        );

        let report = SetupReport {
            sensor: this.sensor_status.clone(),
            layout: this.layout_status.clone(),
            duration: t0.elapsed(),
        };
        (this, report)
    }

    fn attach_sensor(&self, sensor: &dyn AngleSensorSource, opts: &OpenOptions) -> FeedStatus {
        if !sensor.has_sensor(SensorType::HINGE_ANGLE) {
            return FeedStatus::Unavailable("no hinge angle sensor".into());
        }
        let mut stream = match sensor.register(SensorType::HINGE_ANGLE, opts.delay) {
            Ok(s) => s,
            Err(e) => return FeedStatus::Unavailable(e.to_string()),
        };

        let cell = Arc::clone(&self.cell);
        let task = tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                cell.sensor_event(&event);
            }
            tracing::debug!("hinge sensor stream ended");
        });
        lock(&self.tasks).push(task.abort_handle());
        FeedStatus::Available
    }

    fn attach_layout(&self, layout: &dyn LayoutStateSource) -> FeedStatus {
        let mut stream = match layout.subscribe() {
            Ok(s) => s,
            Err(e) => return FeedStatus::Unavailable(e.to_string()),
        };

        let cell = Arc::clone(&self.cell);
        let mut life = self.lifecycle.subscribe();
        let task = tokio::spawn(async move {
            // Newest snapshot that arrived while the owner was stopped.
            let mut pending: Option<WindowLayout> = None;
            loop {
                let state = match life.wait_for(|s| *s != Lifecycle::Stopped).await {
                    Ok(s) => *s,
                    Err(_) => break,
                };
                if state == Lifecycle::Destroyed {
                    break;
                }
                if let Some(layout) = pending.take() {
                    cell.layout(&layout);
                }

                tokio::select! {
                    biased;
                    changed = life.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    item = stream.next() => match item {
                        Some(layout) if *life.borrow() == Lifecycle::Started => cell.layout(&layout),
                        Some(layout) => pending = Some(layout),
                        None => break,
                    },
                }
            }
            tracing::debug!("layout subscription ended");
        });
        lock(&self.tasks).push(task.abort_handle());
        FeedStatus::Available
    }

    /// Current angle in degrees. `0.0` until the first event.
    pub fn query(&self) -> f32 {
        self.cell.sample().angle_deg
    }

    pub fn latest(&self) -> AngleSample {
        self.cell.sample()
    }

    /// Every accepted write, in order. Lagging subscribers skip missed items.
    pub fn subscribe(&self) -> AngleStream {
        BroadcastStream::new(self.cell.tx.subscribe())
            .filter_map(|it| async move { it.ok() })
            .boxed()
    }

    pub fn on_sensor_event(&self, event: &SensorEvent) {
        self.cell.sensor_event(event);
    }

    pub fn on_layout(&self, layout: &WindowLayout) {
        self.cell.layout(layout);
    }

    pub fn on_fold_state(&self, state: FoldState) {
        self.cell.fold_state(state);
    }

    pub fn sensor_status(&self) -> &FeedStatus {
        &self.sensor_status
    }

    pub fn layout_status(&self) -> &FeedStatus {
        &self.layout_status
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }

    /// Forward a lifecycle notification from the owning component.
    pub fn set_lifecycle(&self, state: Lifecycle) {
        if state == Lifecycle::Destroyed {
            self.teardown();
            return;
        }
        self.lifecycle.send_if_modified(|cur| {
            if *cur == Lifecycle::Destroyed || *cur == state {
                return false;
            }
            *cur = state;
            true
        });
    }

    /// Unregister the sensor listener and cancel the layout subscription.
    /// The last value stays readable.
    pub fn teardown(&self) {
        let tasks = std::mem::take(&mut *lock(&self.tasks));
        let was_live = self.lifecycle.send_replace(Lifecycle::Destroyed) != Lifecycle::Destroyed;
        for task in &tasks {
            task.abort();
        }
        if was_live {
            tracing::debug!(tasks = tasks.len(), "hinge angle resolver torn down");
        }
    }
}

impl Drop for HingeAngleResolver {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> HingeAngleResolver {
        HingeAngleResolver::detached(&OpenOptions::default())
    }

    #[test]
    fn starts_at_zero_without_source() {
        let r = resolver();
        assert_eq!(r.query(), 0.0);
        assert!(r.latest().source.is_none());
    }

    #[test]
    fn last_write_wins_across_feeds() {
        let r = resolver();
        r.on_sensor_event(&SensorEvent::hinge(45.0));
        r.on_fold_state(FoldState::Flat);
        assert_eq!(r.query(), 180.0);
        assert_eq!(r.latest().source, Some(Source::FoldingFeature));

        let r = resolver();
        r.on_fold_state(FoldState::Flat);
        r.on_sensor_event(&SensorEvent::hinge(45.0));
        assert_eq!(r.query(), 45.0);
        assert_eq!(r.latest().source, Some(Source::HingeSensor));
    }

    #[test]
    fn other_state_keeps_precise_reading() {
        let r = resolver();
        r.on_sensor_event(&SensorEvent::hinge(137.25));
        r.on_fold_state(FoldState::Other);
        r.on_layout(&WindowLayout::default());
        assert_eq!(r.query(), 137.25);
    }

    #[test]
    fn other_state_keeps_coarse_reading() {
        let r = resolver();
        r.on_fold_state(FoldState::HalfOpened);
        r.on_fold_state(FoldState::Other);
        r.on_layout(&WindowLayout::folded(FoldState::Other));
        r.on_layout(&WindowLayout::default());
        assert_eq!(r.query(), 90.0);
        assert_eq!(r.latest().source, Some(Source::FoldingFeature));
    }

    #[test]
    fn foreign_sensor_type_is_ignored() {
        let r = resolver();
        r.on_sensor_event(&SensorEvent::hinge(30.0));
        r.on_sensor_event(&SensorEvent::new(SensorType::LIGHT, vec![250.0]));
        assert_eq!(r.query(), 30.0);
    }

    #[test]
    fn teardown_is_idempotent_and_keeps_value() {
        let r = resolver();
        r.on_fold_state(FoldState::HalfOpened);
        r.teardown();
        r.teardown();
        assert_eq!(r.lifecycle(), Lifecycle::Destroyed);
        r.set_lifecycle(Lifecycle::Started);
        assert_eq!(r.lifecycle(), Lifecycle::Destroyed);
        assert_eq!(r.query(), 90.0);
    }
}
