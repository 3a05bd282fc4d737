//! Capability traits for the two feeds.
//!
//! A source hands out a stream; dropping the stream unregisters the listener
//! (Feed A) or cancels the subscription (Feed B).

use crate::types::{Error, Result, SensorDelay, SensorEvent, SensorType, WindowLayout};
use futures_util::stream::BoxStream;

pub type SensorStream = BoxStream<'static, SensorEvent>;
pub type LayoutStream = BoxStream<'static, WindowLayout>;

#[derive(Clone, Debug)]
pub struct SourceInfo {
    /// Short backend note like "mock", "linux_iio" or "none".
    pub note: &'static str,
}

/// Feed A: a sensor service that may or may not carry a hinge angle sensor.
pub trait AngleSensorSource: Send + Sync {
    fn has_sensor(&self, kind: SensorType) -> bool;
    fn register(&self, kind: SensorType, delay: SensorDelay) -> Result<SensorStream>;
    fn info(&self) -> SourceInfo;
}

/// Feed B: a window-layout tracker.
pub trait LayoutStateSource: Send + Sync {
    fn subscribe(&self) -> Result<LayoutStream>;
    fn info(&self) -> SourceInfo;
}

/// Sensor service without any sensors.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSensor;

impl AngleSensorSource for NoSensor {
    fn has_sensor(&self, _kind: SensorType) -> bool {
        false
    }

    fn register(&self, kind: SensorType, _delay: SensorDelay) -> Result<SensorStream> {
        Err(Error::Unsupported(format!("no sensor of type {}", kind.0)))
    }

    fn info(&self) -> SourceInfo {
        SourceInfo { note: "none" }
    }
}

/// Platform without a window-layout API.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLayout;

impl LayoutStateSource for NoLayout {
    fn subscribe(&self) -> Result<LayoutStream> {
        Err(Error::Unsupported("window layout tracking".into()))
    }

    fn info(&self) -> SourceInfo {
        SourceInfo { note: "none" }
    }
}
