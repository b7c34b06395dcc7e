//! Core domain types for the fitcalc system.
//!
//! This module defines the value types shared by the calculator:
//! - Measurement systems and units
//! - Biometric inputs (always canonical metric)
//! - Activity levels and goals, with their lenient label parsing
//! - Calculation requests and results

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Units
// ============================================================================

/// Measurement system chosen by the user for entry and display
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Metric,
    #[default]
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    /// Weight unit used for entry and display in this system
    pub fn weight_unit(&self) -> WeightUnit {
        match self {
            UnitSystem::Metric => WeightUnit::Kg,
            UnitSystem::Imperial => WeightUnit::Lbs,
        }
    }

    /// Height unit label ("cm" or the combined "ft/in")
    pub fn height_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "cm",
            UnitSystem::Imperial => "ft/in",
        }
    }

    /// Parse a stored preference value.
    ///
    /// Only an exact `"metric"` selects metric; anything else, including a
    /// missing or garbled value, falls back to imperial.
    pub fn from_preference(value: Option<&str>) -> Self {
        match value {
            Some("metric") => UnitSystem::Metric,
            Some("imperial") | None => UnitSystem::Imperial,
            Some(other) => {
                tracing::warn!(
                    "Unrecognized measurement system {:?}, defaulting to imperial",
                    other
                );
                UnitSystem::Imperial
            }
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            other => Err(Error::Validation(format!(
                "Unknown measurement system '{}' (expected metric or imperial)",
                other
            ))),
        }
    }
}

/// Unit a weight value is expressed in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn label(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Height split into whole feet and inches (display form only)
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeightImperial {
    pub feet: i32,
    pub inches: i32,
}

// ============================================================================
// Biometrics
// ============================================================================

/// Biological sex as used by the BMR equation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    Unspecified,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unspecified => "unspecified",
        }
    }

    /// Case-insensitive parse; anything but male/female is `Unspecified`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "male" => Sex::Male,
            "female" => Sex::Female,
            _ => Sex::Unspecified,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical metric biometrics
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BiometricInput {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: u32,
    pub sex: Sex,
}

impl BiometricInput {
    /// Check that every field is finite and positive
    pub fn validate(&self) -> Result<()> {
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "weight must be a positive number of kg, got {}",
                self.weight_kg
            )));
        }
        if !self.height_cm.is_finite() || self.height_cm <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "height must be a positive number of cm, got {}",
                self.height_cm
            )));
        }
        if self.age_years == 0 {
            return Err(Error::InvalidInput("age must be at least 1 year".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Activity and Goals
// ============================================================================

/// Habitual activity level used to scale BMR into TDEE
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    #[default]
    Sedentary,
    /// Light exercise 1-3 days/week
    LightlyActive,
    /// Moderate exercise 3-5 days/week
    ModeratelyActive,
    /// Hard exercise 6-7 days/week
    VeryActive,
    /// Hard daily exercise or a physical job
    ExtraActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::LightlyActive,
        ActivityLevel::ModeratelyActive,
        ActivityLevel::VeryActive,
        ActivityLevel::ExtraActive,
    ];

    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtraActive => "extra_active",
        }
    }

    /// Parse an activity label.
    ///
    /// Unknown labels resolve to `Sedentary` with a warning.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "sedentary" => ActivityLevel::Sedentary,
            "lightly_active" => ActivityLevel::LightlyActive,
            "moderately_active" => ActivityLevel::ModeratelyActive,
            "very_active" => ActivityLevel::VeryActive,
            "extra_active" => ActivityLevel::ExtraActive,
            _ => {
                tracing::warn!(
                    "Unknown activity level {:?}, using sedentary multiplier",
                    label
                );
                ActivityLevel::Sedentary
            }
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight goal driving the exercise target
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Maintain,
    Lose,
    /// Reserved; currently always yields a zero exercise target
    Gain,
    /// Any unrecognized goal; yields a zero exercise target
    #[serde(other)]
    Other,
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Maintain => "maintain",
            Goal::Lose => "lose",
            Goal::Gain => "gain",
            Goal::Other => "other",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "maintain" => Goal::Maintain,
            "lose" => Goal::Lose,
            "gain" => Goal::Gain,
            _ => {
                tracing::warn!("Unrecognized goal {:?}, exercise target will be 0", label);
                Goal::Other
            }
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Requests and Results
// ============================================================================

/// A validated, canonical metric calculation request.
///
/// This is also the form blob persisted after a successful calculation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    #[serde(flatten)]
    pub biometrics: BiometricInput,
    pub activity_level: ActivityLevel,
    /// Average daily calorie intake (kcal)
    pub intake: f64,
    pub goal: Goal,
    /// Desired total daily deficit (kcal); only meaningful for `Goal::Lose`
    pub desired_deficit: f64,
}

/// Energy estimates in kcal/day at full precision
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub bmr: f64,
    pub tdee: f64,
    pub exercise_target_per_day: f64,
}

/// Results rounded to whole calories for display
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundedResult {
    pub bmr: i64,
    pub tdee: i64,
    pub exercise_target_per_day: i64,
}

impl CalculationResult {
    pub fn rounded(&self) -> RoundedResult {
        RoundedResult {
            bmr: self.bmr.round() as i64,
            tdee: self.tdee.round() as i64,
            exercise_target_per_day: self.exercise_target_per_day.round() as i64,
        }
    }
}
