#![cfg(all(target_os = "linux", feature = "linux_iio"))]

//! Hinge angle from an IIO `angl` channel, as exposed by lid-angle drivers
//! (e.g. `cros-ec-lid-angle`). Polled at the requested delay; an event is
//! emitted only when the reading changes.

use crate::source::{AngleSensorSource, SensorStream, SourceInfo};
use crate::types::{Error, Result, SensorDelay, SensorEvent, SensorType};
use futures_util::StreamExt;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::time::{self, Duration, Interval, MissedTickBehavior};

const DEFAULT_ROOT: &str = "/sys/bus/iio/devices";
const VALUE_FILES: &[&str] = &["in_angl_input", "in_angl0_input", "in_angl_raw", "in_angl0_raw"];
const SCALE_FILES: &[&str] = &["in_angl_scale", "in_angl0_scale"];

pub struct LinuxIioSensor {
    dev: Option<PathBuf>,
}

impl LinuxIioSensor {
    pub fn open() -> Self {
        Self::with_root(DEFAULT_ROOT)
    }

    /// Look for the device under another sysfs root.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let dev = find_iio_angle_device(root.as_ref());
        match &dev {
            Some(p) => tracing::debug!(device = %p.display(), "linux: iio hinge angle device found"),
            None => tracing::debug!("linux: no iio hinge angle device"),
        }
        Self { dev }
    }
}

impl AngleSensorSource for LinuxIioSensor {
    fn has_sensor(&self, kind: SensorType) -> bool {
        kind == SensorType::HINGE_ANGLE && self.dev.is_some()
    }

    fn register(&self, kind: SensorType, delay: SensorDelay) -> Result<SensorStream> {
        let dev = match (&self.dev, kind == SensorType::HINGE_ANGLE) {
            (Some(dev), true) => dev.clone(),
            _ => return Err(Error::Unsupported(format!("linux: no sensor of type {}", kind.0))),
        };

        // sysfs polling below 10ms only burns CPU.
        let period = delay.period().max(Duration::from_millis(10));

        // The interval is created on first poll so registration needs no runtime.
        let stream = futures_util::stream::unfold(
            (None::<Interval>, dev, None::<f32>),
            move |(interval, dev, last)| async move {
                let mut interval = interval.unwrap_or_else(|| {
                    let mut i = time::interval(period);
                    i.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    i
                });
                loop {
                    interval.tick().await;
                    match read_angle(&dev) {
                        Some(deg) if last != Some(deg) => {
                            return Some((SensorEvent::hinge(deg), (Some(interval), dev, Some(deg))));
                        }
                        _ => {}
                    }
                }
            },
        );
        Ok(stream.boxed())
    }

    fn info(&self) -> SourceInfo {
        SourceInfo { note: "linux_iio" }
    }
}

// ==== helpers ====

fn first_existing(base: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|n| base.join(n)).find(|p| p.exists())
}

fn read_f32(p: &Path) -> Option<f32> {
    fs::read_to_string(p).ok()?.trim().parse::<f32>().ok()
}

fn find_iio_angle_device(root: &Path) -> Option<PathBuf> {
    let pattern = root.join("iio:device*");
    for dev in glob::glob(pattern.to_str()?).ok()? {
        let Ok(p) = dev else { continue };
        if first_existing(&p, VALUE_FILES).is_some() {
            return Some(p);
        }
    }
    None
}

fn read_angle(dev: &Path) -> Option<f32> {
    let raw = read_f32(&first_existing(dev, VALUE_FILES)?)?;
    // Drivers without a scale file already report degrees.
    let scale = first_existing(dev, SCALE_FILES)
        .and_then(|p| read_f32(&p))
        .unwrap_or(1.0);
    Some(raw * scale)
}
