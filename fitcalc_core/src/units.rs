//! Conversion between canonical metric values and display units.
//!
//! Everything stored or calculated is in kilograms and centimeters. The
//! functions here translate to and from pounds and feet/inches and format
//! values for display. They know nothing about the energy formulas.

use crate::{Error, HeightImperial, Result, UnitSystem, WeightUnit};

// ============================================================================
// Conversion Constants
// ============================================================================

/// Kilograms per pound
pub const LBS_TO_KG: f64 = 0.453592;
/// Pounds per kilogram
pub const KG_TO_LBS: f64 = 2.20462;
/// Inches per centimeter
pub const CM_TO_INCHES: f64 = 0.393701;
/// Centimeters per inch
pub const INCHES_TO_CM: f64 = 2.54;
/// Inches per foot
pub const INCHES_PER_FOOT: i32 = 12;

// ============================================================================
// Weight
// ============================================================================

/// Convert a weight entered in `unit` to kilograms.
///
/// Tolerant of any input; callers validate positivity first.
pub fn weight_to_canonical(value: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => value,
        WeightUnit::Lbs => value * LBS_TO_KG,
    }
}

/// Convert a canonical kilogram weight to `unit`
pub fn weight_from_canonical(value_kg: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => value_kg,
        WeightUnit::Lbs => value_kg * KG_TO_LBS,
    }
}

// ============================================================================
// Height
// ============================================================================

/// Convert whole feet and inches to centimeters.
///
/// Requires `feet >= 0` and `0 <= inches < 12`.
pub fn height_to_canonical_cm(feet: i32, inches: i32) -> Result<f64> {
    if feet < 0 {
        return Err(Error::InvalidInput(format!(
            "feet must be non-negative, got {}",
            feet
        )));
    }
    if !(0..INCHES_PER_FOOT).contains(&inches) {
        return Err(Error::InvalidInput(format!(
            "inches must be in [0, 12), got {}",
            inches
        )));
    }

    let total_inches = feet
        .checked_mul(INCHES_PER_FOOT)
        .and_then(|i| i.checked_add(inches))
        .ok_or_else(|| {
            Error::InvalidInput(format!("{} ft {} in is out of range", feet, inches))
        })?;
    Ok(f64::from(total_inches) * INCHES_TO_CM)
}

/// Split a centimeter height into whole feet and rounded inches.
///
/// Inches that round up to 12 carry into the next foot. Non-finite or
/// non-positive input yields `0 ft 0 in` rather than an error, and feet
/// saturate at `i32::MAX`.
pub fn height_from_canonical_cm(value_cm: f64) -> HeightImperial {
    if !value_cm.is_finite() || value_cm <= 0.0 {
        tracing::debug!("Cannot convert height {} cm to feet/inches", value_cm);
        return HeightImperial::default();
    }

    let total_inches = value_cm * CM_TO_INCHES;
    let per_foot = f64::from(INCHES_PER_FOOT);
    let feet = (total_inches / per_foot).floor() as i32;
    let inches = (total_inches % per_foot).round() as i32;

    if inches == INCHES_PER_FOOT {
        return HeightImperial {
            feet: feet.saturating_add(1),
            inches: 0,
        };
    }

    HeightImperial { feet, inches }
}

// ============================================================================
// Formatting
// ============================================================================

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Format a kilogram weight in `unit`, e.g. `"154.3 lbs"` or `"70 kg"`
pub fn format_weight(value_kg: f64, unit: WeightUnit, decimals: u32) -> String {
    let display = round_to(weight_from_canonical(value_kg, unit), decimals);
    format!("{} {}", display, unit.label())
}

/// Format a centimeter height for `system`, e.g. `"5 ft 10 in"` or `"178 cm"`
pub fn format_height(value_cm: f64, system: UnitSystem, decimals_cm: u32) -> String {
    match system {
        UnitSystem::Imperial => {
            let HeightImperial { feet, inches } = height_from_canonical_cm(value_cm);
            format!("{} ft {} in", feet, inches)
        }
        UnitSystem::Metric => format!("{} cm", round_to(value_cm, decimals_cm)),
    }
}
