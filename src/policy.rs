//! Mapping from raw feed events to angle writes.
//!
//! Every function here answers "should this event write the state, and with
//! what value". `None` means the event carries no angle and the current value
//! must be kept.

use crate::types::{DisplayFeature, FoldState, FoldingFeature, SensorEvent, SensorType, WindowLayout};

pub const FLAT_DEG: f32 = 180.0;
pub const HALF_OPENED_DEG: f32 = 90.0;

/// Feed A: hinge sensor events write `values[0]` as-is. Other sensor types
/// and empty value arrays are ignored.
pub fn sensor_angle(event: &SensorEvent) -> Option<f32> {
    if event.sensor_type != SensorType::HINGE_ANGLE {
        return None;
    }
    event.values.first().copied()
}

/// Feed B: coarse fold state to angle.
pub fn fold_angle(state: FoldState) -> Option<f32> {
    match state {
        FoldState::Flat => Some(FLAT_DEG),
        FoldState::HalfOpened => Some(HALF_OPENED_DEG),
        FoldState::Other => None,
    }
}

/// First folding feature in the snapshot. Devices with several hinges only
/// report the first one.
pub fn first_fold(layout: &WindowLayout) -> Option<&FoldingFeature> {
    layout.display_features.iter().find_map(|f| match f {
        DisplayFeature::Fold(fold) => Some(fold),
        _ => None,
    })
}

pub fn layout_angle(layout: &WindowLayout) -> Option<f32> {
    first_fold(layout).and_then(|f| fold_angle(f.state))
}
