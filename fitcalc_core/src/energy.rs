//! Energy expenditure formulas.
//!
//! All functions take canonical metric inputs:
//! - BMR via the Mifflin-St Jeor equation
//! - TDEE as BMR scaled by an activity multiplier
//! - Daily exercise target needed to reach a goal given current intake
//! - MET-based calorie burn for a single bout of exercise

use crate::{ActivityLevel, Error, Goal, Result, Sex};

/// Mifflin-St Jeor sex offset for men (kcal/day)
pub const MALE_OFFSET: f64 = 5.0;
/// Mifflin-St Jeor sex offset for women (kcal/day)
pub const FEMALE_OFFSET: f64 = -161.0;
/// Midpoint of the male and female offsets, used when sex is unspecified
pub const UNSPECIFIED_OFFSET: f64 = (MALE_OFFSET + FEMALE_OFFSET) / 2.0;
/// Daily deficit assumed when a weight-loss goal gives none (~1 lb/week)
pub const DEFAULT_DESIRED_DEFICIT: f64 = 500.0;

/// Calculate Basal Metabolic Rate with the Mifflin-St Jeor equation
///
/// Formula: BMR = 10 x weight_kg + 6.25 x height_cm - 5 x age + offset
/// - Male: +5
/// - Female: -161
/// - Unspecified: -78 (midpoint of the two)
///
/// # Errors
///
/// Returns `InvalidInput` if weight or height are not finite and positive,
/// if age is zero, or if the result is not finite.
pub fn calculate_bmr(weight_kg: f64, height_cm: f64, age_years: u32, sex: Sex) -> Result<f64> {
    if !weight_kg.is_finite() || !height_cm.is_finite() || weight_kg <= 0.0 || height_cm <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "weight and height must be positive (got {} kg, {} cm)",
            weight_kg, height_cm
        )));
    }
    if age_years == 0 {
        return Err(Error::InvalidInput("age must be at least 1 year".into()));
    }

    let offset = match sex {
        Sex::Male => MALE_OFFSET,
        Sex::Female => FEMALE_OFFSET,
        Sex::Unspecified => {
            tracing::warn!("Sex not specified as male or female, using midpoint BMR offset");
            UNSPECIFIED_OFFSET
        }
    };

    let bmr = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years) + offset;
    if !bmr.is_finite() {
        return Err(Error::InvalidInput(format!(
            "BMR overflowed for {} kg, {} cm",
            weight_kg, height_cm
        )));
    }

    Ok(bmr)
}

/// Calculate Total Daily Energy Expenditure (BMR x activity multiplier)
pub fn calculate_tdee(bmr: f64, activity_level: ActivityLevel) -> f64 {
    bmr * activity_level.multiplier()
}

/// Calculate the daily exercise burn needed to meet `goal`
///
/// With `balance = tdee - intake` (positive when eating below TDEE):
/// - Maintain: burn off any surplus, `max(0, -balance)`
/// - Lose: make up whatever part of the desired deficit diet does not
///   already cover, `max(0, deficit - balance)`
/// - Gain and unrecognized goals: 0
///
/// `desired_deficit` defaults to [`DEFAULT_DESIRED_DEFICIT`].
///
/// # Errors
///
/// Returns `InvalidInput` if TDEE is not finite and positive, or if intake
/// or the deficit are not finite.
pub fn calculate_exercise_target(
    tdee: f64,
    intake: f64,
    goal: Goal,
    desired_deficit: Option<f64>,
) -> Result<f64> {
    let desired_deficit = desired_deficit.unwrap_or(DEFAULT_DESIRED_DEFICIT);

    if !tdee.is_finite() || tdee <= 0.0 || !intake.is_finite() || !desired_deficit.is_finite() {
        return Err(Error::InvalidInput(format!(
            "invalid TDEE ({}), intake ({}) or desired deficit ({})",
            tdee, intake, desired_deficit
        )));
    }

    let balance = tdee - intake;

    let target = match goal {
        Goal::Maintain => (-balance).max(0.0),
        Goal::Lose => (desired_deficit - balance).max(0.0),
        Goal::Gain | Goal::Other => 0.0,
    };

    Ok(target)
}

/// Estimate calories burned by an exercise bout
///
/// Uses 1 MET = 1 kcal/kg/hour: `met x weight_kg x minutes / 60`.
/// Non-positive or non-finite input returns 0 with a warning instead of an
/// error.
pub fn estimate_calories_burned(met: f64, weight_kg: f64, duration_minutes: f64) -> f64 {
    let valid = [met, weight_kg, duration_minutes]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0);

    if !valid {
        tracing::warn!(
            "Invalid input for calorie estimation (MET {}, {} kg, {} min)",
            met,
            weight_kg,
            duration_minutes
        );
        return 0.0;
    }

    met * weight_kg * (duration_minutes / 60.0)
}
