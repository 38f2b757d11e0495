//! Measurement units and calibration for distance-measurement lines.
//!
//! Scene distances are dimensionless until calibrated. Calibration maps
//! scene units to centimeters (the internal real-world unit); display
//! converts cm to the selected metric unit. A ratio can be stored globally
//! or against a specific reference image — the image-scoped ratio wins for
//! measurement lines owned by that image.

use crate::id::ElementId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display units for measurement labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MetricUnit {
    Mm,
    #[default]
    Cm,
    M,
}

impl MetricUnit {
    /// Centimeters per one of this unit.
    pub fn cm_per_unit(self) -> f32 {
        match self {
            MetricUnit::Mm => 0.1,
            MetricUnit::Cm => 1.0,
            MetricUnit::M => 100.0,
        }
    }

    /// Display decimals: finer units round to one decimal, coarser to two.
    pub fn precision(self) -> usize {
        match self {
            MetricUnit::Mm => 1,
            MetricUnit::Cm | MetricUnit::M => 2,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            MetricUnit::Mm => "mm",
            MetricUnit::Cm => "cm",
            MetricUnit::M => "m",
        }
    }
}

/// Convert a cm value to the given display unit.
pub fn from_cm(value_cm: f32, unit: MetricUnit) -> f32 {
    value_cm / unit.cm_per_unit()
}

/// Convert a value in the given unit back to cm.
pub fn to_cm(value: f32, unit: MetricUnit) -> f32 {
    value * unit.cm_per_unit()
}

/// Format a cm distance in the given unit, trimming trailing zeros
/// (`12.30` → `12.3`, `7.00` → `7`).
pub fn format_distance(value_cm: f32, unit: MetricUnit) -> String {
    let converted = from_cm(value_cm, unit);
    let mut text = format!("{:.*}", unit.precision(), converted);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    format!("{text} {}", unit.suffix())
}

/// Scene-to-real-world calibration: a global cm-per-scene-unit ratio plus
/// per-reference-image overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calibration {
    cm_per_unit: f32,
    per_image: HashMap<ElementId, f32>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            cm_per_unit: 1.0,
            per_image: HashMap::new(),
        }
    }
}

impl Calibration {
    /// The ratio in effect for a measurement line, preferring the owner
    /// image's ratio over the global one.
    pub fn ratio_for(&self, owner_image: Option<ElementId>) -> f32 {
        owner_image
            .and_then(|id| self.per_image.get(&id).copied())
            .unwrap_or(self.cm_per_unit)
    }

    /// Inverse calibration: the user entered the real length (in cm) of a
    /// line currently `scene_length` units long. Stores the resulting ratio
    /// at the narrowest applicable scope. Degenerate inputs are a no-op.
    pub fn calibrate(
        &mut self,
        owner_image: Option<ElementId>,
        entered_cm: f32,
        scene_length: f32,
    ) -> bool {
        if !entered_cm.is_finite() || entered_cm <= 0.0 || scene_length <= 0.0 {
            return false;
        }
        let ratio = entered_cm / scene_length;
        match owner_image {
            Some(id) => {
                self.per_image.insert(id, ratio);
            }
            None => self.cm_per_unit = ratio,
        }
        true
    }
}
