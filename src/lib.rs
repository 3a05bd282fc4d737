//! Public API surface, default sources, and blocking helpers.
//!
//! A [`HingeAngleResolver`] tracks the last hinge angle reported by either a
//! hinge angle sensor or the folding state of the window layout, and answers
//! [`HingeAngleResolver::query`] synchronously. Both feeds are best effort:
//! a missing sensor or layout API leaves that feed inactive and is never an
//! error.

#[cfg(feature = "mock")]
mod backend_mock;

#[cfg(all(target_os = "linux", feature = "linux_iio"))]
mod backend_linux;

pub mod channel;
pub mod policy;
pub mod resolver;
pub mod source;
pub mod types;

#[cfg(all(target_os = "linux", feature = "linux_iio"))]
pub use crate::backend_linux::LinuxIioSensor;
pub use crate::channel::{HingeChannel, MethodCall, MethodResponse};
pub use crate::resolver::{HingeAngleResolver, Lifecycle, SetupReport};
pub use crate::source::{AngleSensorSource, LayoutStateSource, NoLayout, NoSensor, SourceInfo};
pub use crate::types::{
    AngleSample, DisplayFeature, Error, FeedStatus, FoldState, FoldingFeature, Result, SensorDelay,
    SensorEvent, SensorType, Source, WindowLayout,
};

/// In-memory sources for tests, demos and hosts without hardware.
#[cfg(feature = "mock")]
pub mod mock {
    pub use crate::backend_mock::{MockLayoutSource, MockSensorSource};
}

use futures_util::stream::BoxStream;
use once_cell::sync::Lazy;

pub type AngleStream = BoxStream<'static, AngleSample>;

// ===== Global Tokio runtime for blocking variants =====

static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to init Tokio runtime")
});

// ===== Open options =====

#[derive(Clone, Debug)]
pub struct OpenOptions {
    /// Attach the hinge angle sensor feed.
    pub sensor: bool,
    /// Attach the window-layout feed.
    pub layout: bool,
    pub delay: SensorDelay,
    /// Buffer of the change stream handed out by `subscribe()`.
    pub capacity: usize,
    pub channel: String,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            sensor: true,
            layout: true,
            delay: SensorDelay::Normal,
            capacity: 256,
            channel: channel::DEFAULT_CHANNEL.to_string(),
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with `HINGE_ANGLE_DISABLE_SENSOR=1` / `HINGE_ANGLE_DISABLE_LAYOUT=1`
    /// turning a feed off.
    pub fn from_env() -> Self {
        let off = |key: &str| std::env::var(key).ok().as_deref() == Some("1");
        Self::default()
            .sensor(!off("HINGE_ANGLE_DISABLE_SENSOR"))
            .layout(!off("HINGE_ANGLE_DISABLE_LAYOUT"))
    }

    pub fn sensor(mut self, on: bool) -> Self {
        self.sensor = on;
        self
    }
    pub fn layout(mut self, on: bool) -> Self {
        self.layout = on;
        self
    }
    pub fn delay(mut self, delay: SensorDelay) -> Self {
        self.delay = delay;
        self
    }
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
    pub fn channel(mut self, name: impl Into<String>) -> Self {
        self.channel = name.into();
        self
    }
}

// ===== Platform defaults =====

/// Sensor service for this platform, or [`NoSensor`].
pub fn default_sensor_source() -> Box<dyn AngleSensorSource> {
    #[cfg(all(target_os = "linux", feature = "linux_iio"))]
    let source: Box<dyn AngleSensorSource> = Box::new(LinuxIioSensor::open());
    #[cfg(not(all(target_os = "linux", feature = "linux_iio")))]
    let source: Box<dyn AngleSensorSource> = Box::new(NoSensor);
    source
}

/// No bundled platform exposes a window-layout tracker; hosts that have one
/// pass it to [`init`].
pub fn default_layout_source() -> Box<dyn LayoutStateSource> {
    Box::new(NoLayout)
}

// ===== Unified init =====

/// Attach both feeds and return the resolver with a report of which feeds
/// came up. Never fails; unavailable feeds are recorded in the report.
pub async fn init(
    sensor: &dyn AngleSensorSource,
    layout: &dyn LayoutStateSource,
    opts: &OpenOptions,
) -> (HingeAngleResolver, SetupReport) {
    HingeAngleResolver::start(sensor, layout, opts)
}

// ===== Public API (thin) =====

/// Async: open with the platform's default sources.
pub async fn open() -> HingeAngleResolver {
    open_with(OpenOptions::from_env()).await
}

/// Async: open with options and the platform's default sources.
pub async fn open_with(opts: OpenOptions) -> HingeAngleResolver {
    let sensor = default_sensor_source();
    let layout = default_layout_source();
    let (resolver, _report) = init(sensor.as_ref(), layout.as_ref(), &opts).await;
    resolver
}

/// Blocking: open with the platform's default sources.
/// Uses a global multithreaded Tokio runtime; avoid calling from async contexts.
pub fn open_blocking() -> HingeAngleResolver {
    RUNTIME.block_on(open())
}

/// Blocking: open with options.
/// Uses a global multithreaded Tokio runtime; avoid calling from async contexts.
pub fn open_blocking_with(opts: OpenOptions) -> HingeAngleResolver {
    RUNTIME.block_on(open_with(opts))
}

/// Blocking: attach the given sources on the global runtime. Feed tasks keep
/// running there after this returns.
pub fn init_blocking(
    sensor: &dyn AngleSensorSource,
    layout: &dyn LayoutStateSource,
    opts: &OpenOptions,
) -> (HingeAngleResolver, SetupReport) {
    RUNTIME.block_on(init(sensor, layout, opts))
}
