use serde::{Deserialize, Serialize};
use std::time::Instant;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Which feed produced a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    HingeSensor,
    FoldingFeature,
}

/// Copy of the resolver state handed out to readers.
#[derive(Clone, Copy, Debug)]
pub struct AngleSample {
    pub angle_deg: f32,
    pub timestamp: Instant,
    /// `None` until the first accepted event.
    pub source: Option<Source>,
}

/// Outcome of a feed setup attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedStatus {
    Available,
    Unavailable(String),
}

impl FeedStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, FeedStatus::Available)
    }
}

// ===== Feed A: sensor events =====

/// Platform sensor type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SensorType(pub i32);

impl SensorType {
    pub const ACCELEROMETER: SensorType = SensorType(1);
    pub const LIGHT: SensorType = SensorType(5);
    pub const HINGE_ANGLE: SensorType = SensorType(36);
}

/// Requested sampling rate for a sensor listener.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SensorDelay {
    Fastest,
    Game,
    Ui,
    #[default]
    Normal,
}

impl SensorDelay {
    /// Nominal sampling period.
    pub fn period(self) -> std::time::Duration {
        std::time::Duration::from_micros(match self {
            SensorDelay::Fastest => 0,
            SensorDelay::Game => 20_000,
            SensorDelay::Ui => 66_667,
            SensorDelay::Normal => 200_000,
        })
    }
}

#[derive(Clone, Debug)]
pub struct SensorEvent {
    pub sensor_type: SensorType,
    pub values: Vec<f32>,
    pub timestamp: Instant,
}

impl SensorEvent {
    pub fn new(sensor_type: SensorType, values: impl Into<Vec<f32>>) -> Self {
        Self {
            sensor_type,
            values: values.into(),
            timestamp: Instant::now(),
        }
    }

    pub fn hinge(angle_deg: f32) -> Self {
        Self::new(SensorType::HINGE_ANGLE, vec![angle_deg])
    }
}

// ===== Feed B: window layout =====

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoldState {
    Flat,
    HalfOpened,
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldOrientation {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldingFeature {
    #[serde(default)]
    pub bounds: Bounds,
    pub state: FoldState,
    #[serde(default)]
    pub orientation: FoldOrientation,
}

impl FoldingFeature {
    pub fn new(state: FoldState) -> Self {
        Self {
            bounds: Bounds::default(),
            state,
            orientation: FoldOrientation::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayFeature {
    Fold(FoldingFeature),
    Cutout {
        #[serde(default)]
        bounds: Bounds,
    },
}

/// One snapshot of how the display area is split.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLayout {
    #[serde(default)]
    pub display_features: Vec<DisplayFeature>,
}

impl WindowLayout {
    pub fn folded(state: FoldState) -> Self {
        Self {
            display_features: vec![DisplayFeature::Fold(FoldingFeature::new(state))],
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
