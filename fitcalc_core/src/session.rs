//! Calculation session: raw form in, metric results out.
//!
//! A session walks `Idle -> Validating -> Computing -> Succeeded | Failed`.
//! Validation parses every form field in the active unit system and reports
//! the first problem as a user-facing message. Computing converts to
//! canonical metric and runs BMR -> TDEE -> exercise target at full
//! precision. A finished session cannot be rerun; each submission gets a
//! fresh one.

use crate::config::DisplayConfig;
use crate::energy::{
    calculate_bmr, calculate_exercise_target, calculate_tdee, DEFAULT_DESIRED_DEFICIT,
};
use crate::units::{self, INCHES_PER_FOOT};
use crate::{
    ActivityLevel, BiometricInput, CalculationRequest, CalculationResult, Error, Goal,
    HeightImperial, Result, Sex, UnitSystem, WeightUnit,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Form Input
// ============================================================================

/// Form values as typed by the user, in the active unit system.
///
/// Blank strings mean "not provided". Height uses `height_cm` in the metric
/// system and `height_feet` + `height_inches` in the imperial system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFormInput {
    pub weight: String,
    pub height_cm: String,
    pub height_feet: String,
    pub height_inches: String,
    pub age_years: String,
    pub sex: String,
    pub activity_level: String,
    pub intake: String,
    pub goal: String,
    pub desired_deficit: String,
}

impl Default for RawFormInput {
    fn default() -> Self {
        Self {
            weight: String::new(),
            height_cm: String::new(),
            height_feet: String::new(),
            height_inches: String::new(),
            age_years: String::new(),
            sex: Sex::Female.as_str().into(),
            activity_level: ActivityLevel::Sedentary.as_str().into(),
            intake: String::new(),
            goal: Goal::Maintain.as_str().into(),
            desired_deficit: DEFAULT_DESIRED_DEFICIT.to_string(),
        }
    }
}

impl RawFormInput {
    /// Rebuild the form from a saved request, expressed in `system` units.
    ///
    /// Weight is rounded to 0.1 of the display unit and metric height to
    /// whole centimeters, matching what a user would have typed.
    pub fn prefill(request: &CalculationRequest, system: UnitSystem) -> Self {
        let bio = &request.biometrics;
        let weight = units::round_to(
            units::weight_from_canonical(bio.weight_kg, system.weight_unit()),
            1,
        );

        let (height_cm, height_feet, height_inches) = match system {
            UnitSystem::Metric => (bio.height_cm.round().to_string(), String::new(), String::new()),
            UnitSystem::Imperial => {
                let HeightImperial { feet, inches } = units::height_from_canonical_cm(bio.height_cm);
                (String::new(), feet.to_string(), inches.to_string())
            }
        };

        Self {
            weight: weight.to_string(),
            height_cm,
            height_feet,
            height_inches,
            age_years: bio.age_years.to_string(),
            sex: bio.sex.as_str().into(),
            activity_level: request.activity_level.as_str().into(),
            intake: request.intake.to_string(),
            goal: request.goal.as_str().into(),
            desired_deficit: request.desired_deficit.to_string(),
        }
    }
}

/// A height as entered, in either representation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HeightEntry {
    Centimeters(f64),
    FeetInches(HeightImperial),
}

/// Form after parsing; numbers are still in the entry units
#[derive(Clone, Copy, Debug, PartialEq)]
struct ValidatedForm {
    weight: f64,
    height: HeightEntry,
    age_years: u32,
    sex: Sex,
    activity_level: ActivityLevel,
    intake: f64,
    goal: Goal,
    desired_deficit: f64,
}

// ============================================================================
// Session
// ============================================================================

/// Outcome of a successful session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    /// Canonical metric echo of the input, ready to persist
    pub request: CalculationRequest,
    pub result: CalculationResult,
}

/// Where a session is in its lifecycle
#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Idle,
    Validating,
    Computing,
    Succeeded(SessionOutcome),
    Failed { reason: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Validating => "validating",
            SessionState::Computing => "computing",
            SessionState::Succeeded(_) => "succeeded",
            SessionState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Succeeded(_) | SessionState::Failed { .. }
        )
    }
}

/// A single validate-then-compute run
#[derive(Debug)]
pub struct CalculationSession {
    id: Uuid,
    system: UnitSystem,
    state: SessionState,
}

impl CalculationSession {
    pub fn new(system: UnitSystem) -> Self {
        Self {
            id: Uuid::new_v4(),
            system,
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.system
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Validate `raw` and compute results.
    ///
    /// # Errors
    ///
    /// - `Validation` for any missing or out-of-range field
    /// - `InvalidInput` if a formula precondition fails after validation
    /// - `Session` if this session has already run
    pub fn run(&mut self, raw: &RawFormInput) -> Result<SessionOutcome> {
        if self.state != SessionState::Idle {
            return Err(Error::Session(format!(
                "session {} is already {}; start a new session",
                self.id,
                self.state.name()
            )));
        }

        self.transition(SessionState::Validating);
        let computed = match validate(raw, self.system) {
            Ok(form) => {
                self.transition(SessionState::Computing);
                compute(&form, self.system)
            }
            Err(e) => Err(e),
        };

        match computed {
            Ok(outcome) => {
                self.transition(SessionState::Succeeded(outcome.clone()));
                Ok(outcome)
            }
            Err(e) => {
                self.transition(SessionState::Failed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(
            "Session {}: {} -> {}",
            self.id,
            self.state.name(),
            next.name()
        );
        self.state = next;
    }
}

/// Run a fresh session over `raw` in `system` units
pub fn run_calculation(raw: &RawFormInput, system: UnitSystem) -> Result<SessionOutcome> {
    CalculationSession::new(system).run(raw)
}

// ============================================================================
// Validation
// ============================================================================

/// Heaviest weight accepted from a form (kg)
pub const MAX_WEIGHT_KG: f64 = 1000.0;
/// Tallest metric height accepted from a form (cm)
pub const MAX_HEIGHT_CM: f64 = 300.0;
/// Most whole feet accepted from an imperial form
pub const MAX_HEIGHT_FEET: i32 = 9;

fn validate(raw: &RawFormInput, system: UnitSystem) -> Result<ValidatedForm> {
    let weight_unit = system.weight_unit();
    let weight = parse_positive(&raw.weight).ok_or_else(|| {
        Error::Validation(format!(
            "Please enter a valid positive number for weight in {}.",
            weight_unit
        ))
    })?;
    let weight = check_weight(weight, weight_unit)?;

    let height = match system {
        UnitSystem::Metric => {
            let cm = parse_positive(&raw.height_cm).ok_or_else(|| {
                Error::Validation("Please enter a valid positive number for height in cm.".into())
            })?;
            HeightEntry::Centimeters(check_height_cm(cm)?)
        }
        UnitSystem::Imperial => HeightEntry::FeetInches(parse_feet_inches(
            &raw.height_feet,
            &raw.height_inches,
        )?),
    };

    let age_years = raw
        .age_years
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|age| *age >= 1)
        .ok_or_else(|| {
            Error::Validation("Please enter a valid whole number of years (at least 1) for age.".into())
        })?;

    let sex = required(&raw.sex, "Please select a sex.")?;
    let activity = required(&raw.activity_level, "Please select an activity level.")?;

    let intake = parse_finite(&raw.intake)
        .filter(|v| *v >= 0.0)
        .ok_or_else(|| {
            Error::Validation(
                "Please enter a valid non-negative number for daily calorie intake.".into(),
            )
        })?;

    let goal = Goal::from_label(required(&raw.goal, "Please select a goal.")?);

    let desired_deficit = if goal == Goal::Lose {
        parse_positive(&raw.desired_deficit).ok_or_else(|| {
            Error::Validation(
                "Please enter a valid positive number for desired deficit when the goal is to lose weight."
                    .into(),
            )
        })?
    } else {
        parse_positive(&raw.desired_deficit).unwrap_or(DEFAULT_DESIRED_DEFICIT)
    };

    Ok(ValidatedForm {
        weight,
        height,
        age_years,
        sex: Sex::from_label(sex),
        activity_level: ActivityLevel::from_label(activity),
        intake,
        goal,
        desired_deficit,
    })
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(message.into()));
    }
    Ok(trimmed)
}

fn parse_finite(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_positive(value: &str) -> Option<f64> {
    parse_finite(value).filter(|v| *v > 0.0)
}

fn invalid_feet_inches() -> Error {
    Error::Validation(
        "Please enter valid whole numbers for height (feet and inches, inches < 12).".into(),
    )
}

fn parse_feet_inches(feet: &str, inches: &str) -> Result<HeightImperial> {
    let feet = feet
        .trim()
        .parse::<i32>()
        .map_err(|_| invalid_feet_inches())?;
    let inches = inches
        .trim()
        .parse::<i32>()
        .map_err(|_| invalid_feet_inches())?;

    check_feet_inches(HeightImperial { feet, inches })
}

fn check_weight(weight: f64, unit: WeightUnit) -> Result<f64> {
    if units::weight_to_canonical(weight, unit) > MAX_WEIGHT_KG {
        return Err(Error::Validation(format!(
            "Please enter a weight of at most {}.",
            units::format_weight(MAX_WEIGHT_KG, unit, 0)
        )));
    }
    Ok(weight)
}

fn check_height_cm(cm: f64) -> Result<f64> {
    if cm > MAX_HEIGHT_CM {
        return Err(Error::Validation(format!(
            "Please enter a height of at most {} cm.",
            MAX_HEIGHT_CM
        )));
    }
    Ok(cm)
}

fn check_feet_inches(height: HeightImperial) -> Result<HeightImperial> {
    if height.feet < 0 || !(0..INCHES_PER_FOOT).contains(&height.inches) {
        return Err(invalid_feet_inches());
    }
    if height.feet > MAX_HEIGHT_FEET {
        return Err(Error::Validation(format!(
            "Please enter a height of at most {} ft {} in.",
            MAX_HEIGHT_FEET,
            INCHES_PER_FOOT - 1
        )));
    }
    if height.feet == 0 && height.inches == 0 {
        return Err(Error::Validation(
            "Calculated height (0 cm) is invalid. Please check inputs.".into(),
        ));
    }
    Ok(height)
}

// ============================================================================
// Computing
// ============================================================================

fn to_canonical_height(height: HeightEntry) -> Result<f64> {
    match height {
        HeightEntry::Centimeters(cm) => Ok(cm),
        HeightEntry::FeetInches(h) => units::height_to_canonical_cm(h.feet, h.inches),
    }
}

fn compute(form: &ValidatedForm, system: UnitSystem) -> Result<SessionOutcome> {
    let biometrics = BiometricInput {
        weight_kg: units::weight_to_canonical(form.weight, system.weight_unit()),
        height_cm: to_canonical_height(form.height)?,
        age_years: form.age_years,
        sex: form.sex,
    };
    biometrics.validate()?;

    let bmr = calculate_bmr(
        biometrics.weight_kg,
        biometrics.height_cm,
        biometrics.age_years,
        biometrics.sex,
    )?;
    let tdee = calculate_tdee(bmr, form.activity_level);
    let exercise_target_per_day =
        calculate_exercise_target(tdee, form.intake, form.goal, Some(form.desired_deficit))?;

    tracing::info!(
        "Calculated BMR {:.1}, TDEE {:.1}, exercise target {:.1} kcal/day",
        bmr,
        tdee,
        exercise_target_per_day
    );

    Ok(SessionOutcome {
        request: CalculationRequest {
            biometrics,
            activity_level: form.activity_level,
            intake: form.intake,
            goal: form.goal,
            desired_deficit: form.desired_deficit,
        },
        result: CalculationResult {
            bmr,
            tdee,
            exercise_target_per_day,
        },
    })
}

// ============================================================================
// Display and Storage Boundaries
// ============================================================================

/// Human-readable values in the user's unit system
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayStrings {
    pub weight: String,
    pub height: String,
    pub bmr: Option<String>,
    pub tdee: Option<String>,
    pub exercise_target_per_day: Option<String>,
}

/// Format a stored request (and optionally its results) for display
pub fn convert_for_display(
    request: &CalculationRequest,
    result: Option<&CalculationResult>,
    system: UnitSystem,
) -> DisplayStrings {
    convert_for_display_with(request, result, system, &DisplayConfig::default())
}

/// Like [`convert_for_display`], with explicit precision settings
pub fn convert_for_display_with(
    request: &CalculationRequest,
    result: Option<&CalculationResult>,
    system: UnitSystem,
    display: &DisplayConfig,
) -> DisplayStrings {
    let bio = &request.biometrics;
    let rounded = result.map(CalculationResult::rounded);

    DisplayStrings {
        weight: units::format_weight(bio.weight_kg, system.weight_unit(), display.weight_decimals),
        height: units::format_height(bio.height_cm, system, display.height_decimals_cm),
        bmr: rounded.map(|r| r.bmr.to_string()),
        tdee: rounded.map(|r| r.tdee.to_string()),
        exercise_target_per_day: rounded.map(|r| r.exercise_target_per_day.to_string()),
    }
}

/// A single value typed in display units
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DisplayMeasurement {
    /// Weight in the unit system's weight unit
    Weight(f64),
    /// Height in whichever representation it was entered
    Height(HeightEntry),
}

/// A single value in canonical metric units
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CanonicalValue {
    Kilograms(f64),
    Centimeters(f64),
}

impl CanonicalValue {
    /// The bare number, in kg or cm
    pub fn value(&self) -> f64 {
        match self {
            CanonicalValue::Kilograms(v) | CanonicalValue::Centimeters(v) => *v,
        }
    }
}

/// Convert a display-unit value to canonical metric for storage.
///
/// # Errors
///
/// Returns `Validation` if the value is not positive, exceeds the form
/// limits, or if feet/inches are out of range.
pub fn convert_for_storage(value: DisplayMeasurement, system: UnitSystem) -> Result<CanonicalValue> {
    match value {
        DisplayMeasurement::Weight(w) => {
            let unit = system.weight_unit();
            if !w.is_finite() || w <= 0.0 {
                return Err(Error::Validation(format!(
                    "Please enter a valid positive weight in {}.",
                    unit
                )));
            }
            let w = check_weight(w, unit)?;
            Ok(CanonicalValue::Kilograms(units::weight_to_canonical(w, unit)))
        }
        DisplayMeasurement::Height(HeightEntry::Centimeters(cm)) => {
            if !cm.is_finite() || cm <= 0.0 {
                return Err(Error::Validation(
                    "Please enter a valid positive number for height in cm.".into(),
                ));
            }
            Ok(CanonicalValue::Centimeters(check_height_cm(cm)?))
        }
        DisplayMeasurement::Height(HeightEntry::FeetInches(h)) => {
            let h = check_feet_inches(h)?;
            Ok(CanonicalValue::Centimeters(units::height_to_canonical_cm(
                h.feet, h.inches,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric_form() -> RawFormInput {
        RawFormInput {
            weight: "70".into(),
            height_cm: "175".into(),
            age_years: "30".into(),
            sex: "male".into(),
            activity_level: "sedentary".into(),
            intake: "2000".into(),
            goal: "maintain".into(),
            ..RawFormInput::default()
        }
    }

    fn imperial_form() -> RawFormInput {
        RawFormInput {
            weight: "154".into(),
            height_feet: "5".into(),
            height_inches: "9".into(),
            age_years: "40".into(),
            sex: "female".into(),
            activity_level: "moderately_active".into(),
            intake: "1800".into(),
            goal: "lose".into(),
            desired_deficit: "500".into(),
            ..RawFormInput::default()
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn validation_message(result: Result<SessionOutcome>) -> String {
        match result {
            Err(Error::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_form() {
        let form = RawFormInput::default();
        assert_eq!(form.sex, "female");
        assert_eq!(form.activity_level, "sedentary");
        assert_eq!(form.goal, "maintain");
        assert_eq!(form.desired_deficit, "500");
        assert!(form.weight.is_empty());
    }

    #[test]
    fn test_metric_calculation() {
        crate::logging::init_test();
        let outcome = run_calculation(&metric_form(), UnitSystem::Metric).unwrap();

        assert_close(outcome.result.bmr, 1648.75);
        assert_close(outcome.result.tdee, 1978.5);
        // Intake 2000 exceeds TDEE by 21.5
        assert_close(outcome.result.exercise_target_per_day, 21.5);

        let rounded = outcome.result.rounded();
        assert_eq!(rounded.bmr, 1649);
        assert_eq!(rounded.tdee, 1979);
        assert_eq!(rounded.exercise_target_per_day, 22);

        assert_eq!(outcome.request.biometrics.weight_kg, 70.0);
        assert_eq!(outcome.request.biometrics.height_cm, 175.0);
        assert_eq!(outcome.request.goal, Goal::Maintain);
    }

    #[test]
    fn test_imperial_calculation_converts_to_metric() {
        let outcome = run_calculation(&imperial_form(), UnitSystem::Imperial).unwrap();

        let weight_kg = 154.0 * units::LBS_TO_KG;
        let height_cm = 69.0 * units::INCHES_TO_CM;
        assert_close(outcome.request.biometrics.weight_kg, weight_kg);
        assert_close(outcome.request.biometrics.height_cm, height_cm);

        let bmr = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * 40.0 - 161.0;
        let tdee = bmr * 1.55;
        let target = (500.0 - (tdee - 1800.0)).max(0.0);
        assert_close(outcome.result.bmr, bmr);
        assert_close(outcome.result.tdee, tdee);
        assert_close(outcome.result.exercise_target_per_day, target);
    }

    #[test]
    fn test_session_state_transitions() {
        let mut session = CalculationSession::new(UnitSystem::Metric);
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.unit_system(), UnitSystem::Metric);

        let outcome = session.run(&metric_form()).unwrap();
        assert_eq!(session.state(), &SessionState::Succeeded(outcome));
        assert!(session.state().is_terminal());
    }

    #[test]
    fn test_failed_session_records_reason() {
        let mut session = CalculationSession::new(UnitSystem::Metric);
        let form = RawFormInput {
            weight: "".into(),
            ..metric_form()
        };

        assert!(session.run(&form).is_err());
        match session.state() {
            SessionState::Failed { reason } => assert!(reason.contains("weight in kg")),
            other => panic!("expected failed state, got {:?}", other),
        }
    }

    #[test]
    fn test_finished_session_cannot_rerun() {
        let mut session = CalculationSession::new(UnitSystem::Metric);
        session.run(&metric_form()).unwrap();

        let second = session.run(&metric_form());
        assert!(matches!(second, Err(Error::Session(_))));
        assert!(matches!(session.state(), SessionState::Succeeded(_)));
    }

    #[test]
    fn test_each_invalid_field_is_rejected() {
        let cases = vec![
            (RawFormInput { weight: "0".into(), ..metric_form() }, "weight"),
            (RawFormInput { weight: "abc".into(), ..metric_form() }, "weight"),
            (RawFormInput { weight: "NaN".into(), ..metric_form() }, "weight"),
            (RawFormInput { height_cm: "-5".into(), ..metric_form() }, "height"),
            (RawFormInput { age_years: "0".into(), ..metric_form() }, "age"),
            (RawFormInput { age_years: "30.5".into(), ..metric_form() }, "age"),
            (RawFormInput { sex: " ".into(), ..metric_form() }, "sex"),
            (RawFormInput { activity_level: "".into(), ..metric_form() }, "activity"),
            (RawFormInput { intake: "-1".into(), ..metric_form() }, "intake"),
            (RawFormInput { intake: "".into(), ..metric_form() }, "intake"),
            (RawFormInput { goal: "".into(), ..metric_form() }, "goal"),
        ];

        for (form, field) in cases {
            let msg = validation_message(run_calculation(&form, UnitSystem::Metric));
            assert!(
                msg.contains(field),
                "message {:?} should mention {}",
                msg,
                field
            );
        }
    }

    #[test]
    fn test_imperial_height_validation() {
        let inches_too_big = RawFormInput {
            height_inches: "12".into(),
            ..imperial_form()
        };
        assert!(validation_message(run_calculation(&inches_too_big, UnitSystem::Imperial))
            .contains("inches < 12"));

        let fractional = RawFormInput {
            height_inches: "9.5".into(),
            ..imperial_form()
        };
        assert!(run_calculation(&fractional, UnitSystem::Imperial).is_err());

        let zero = RawFormInput {
            height_feet: "0".into(),
            height_inches: "0".into(),
            ..imperial_form()
        };
        assert!(validation_message(run_calculation(&zero, UnitSystem::Imperial))
            .contains("Calculated height"));
    }

    #[test]
    fn test_huge_feet_fail_validation() {
        let form = RawFormInput {
            weight: "154".into(),
            height_feet: "178956971".into(),
            height_inches: "0".into(),
            age_years: "40".into(),
            intake: "1800".into(),
            ..RawFormInput::default()
        };
        assert!(validation_message(run_calculation(&form, UnitSystem::Imperial))
            .contains("at most 9 ft 11 in"));

        let tallest = RawFormInput {
            height_feet: "9".into(),
            height_inches: "11".into(),
            ..imperial_form()
        };
        assert!(run_calculation(&tallest, UnitSystem::Imperial).is_ok());
    }

    #[test]
    fn test_absurd_metric_values_fail_validation() {
        let heavy = RawFormInput {
            weight: "1e308".into(),
            ..metric_form()
        };
        assert!(validation_message(run_calculation(&heavy, UnitSystem::Metric))
            .contains("at most 1000 kg"));

        let tall = RawFormInput {
            height_cm: "1e308".into(),
            ..metric_form()
        };
        assert!(validation_message(run_calculation(&tall, UnitSystem::Metric))
            .contains("at most 300 cm"));
    }

    #[test]
    fn test_weight_limit_in_pounds() {
        let heavy = RawFormInput {
            weight: "2300".into(),
            ..imperial_form()
        };
        assert!(validation_message(run_calculation(&heavy, UnitSystem::Imperial))
            .contains("at most 2205 lbs"));

        let under = RawFormInput {
            weight: "2200".into(),
            ..imperial_form()
        };
        assert!(run_calculation(&under, UnitSystem::Imperial).is_ok());
    }

    #[test]
    fn test_imperial_form_ignores_cm_field() {
        // Metric height field is not consulted in the imperial system
        let form = RawFormInput {
            height_cm: "garbage".into(),
            ..imperial_form()
        };
        assert!(run_calculation(&form, UnitSystem::Imperial).is_ok());

        // And the imperial fields are required there
        let missing = RawFormInput {
            height_feet: "".into(),
            ..imperial_form()
        };
        assert!(run_calculation(&missing, UnitSystem::Imperial).is_err());
    }

    #[test]
    fn test_lose_requires_positive_deficit() {
        let blank = RawFormInput {
            desired_deficit: "".into(),
            ..imperial_form()
        };
        assert!(validation_message(run_calculation(&blank, UnitSystem::Imperial))
            .contains("desired deficit"));

        let negative = RawFormInput {
            desired_deficit: "-100".into(),
            ..imperial_form()
        };
        assert!(run_calculation(&negative, UnitSystem::Imperial).is_err());
    }

    #[test]
    fn test_maintain_ignores_blank_deficit() {
        let form = RawFormInput {
            desired_deficit: "".into(),
            ..metric_form()
        };
        let outcome = run_calculation(&form, UnitSystem::Metric).unwrap();
        assert_eq!(outcome.request.desired_deficit, DEFAULT_DESIRED_DEFICIT);
    }

    #[test]
    fn test_lenient_labels() {
        let form = RawFormInput {
            sex: "prefer not to say".into(),
            activity_level: "couch".into(),
            goal: "bulk".into(),
            ..metric_form()
        };
        let outcome = run_calculation(&form, UnitSystem::Metric).unwrap();

        assert_eq!(outcome.request.biometrics.sex, Sex::Unspecified);
        assert_eq!(outcome.request.activity_level, ActivityLevel::Sedentary);
        assert_eq!(outcome.request.goal, Goal::Other);
        assert_close(outcome.result.bmr, 1565.75);
        assert_close(outcome.result.tdee, 1565.75 * 1.2);
        assert_eq!(outcome.result.exercise_target_per_day, 0.0);
    }

    #[test]
    fn test_prefill_metric() {
        let outcome = run_calculation(&metric_form(), UnitSystem::Metric).unwrap();
        let form = RawFormInput::prefill(&outcome.request, UnitSystem::Metric);

        assert_eq!(form.weight, "70");
        assert_eq!(form.height_cm, "175");
        assert!(form.height_feet.is_empty());
        assert_eq!(form.age_years, "30");
        assert_eq!(form.sex, "male");
        assert_eq!(form.intake, "2000");

        let again = run_calculation(&form, UnitSystem::Metric).unwrap();
        assert_eq!(again, outcome);
    }

    #[test]
    fn test_prefill_switches_unit_system() {
        let outcome = run_calculation(&metric_form(), UnitSystem::Metric).unwrap();
        let form = RawFormInput::prefill(&outcome.request, UnitSystem::Imperial);

        assert_eq!(form.weight, "154.3");
        assert_eq!(form.height_feet, "5");
        assert_eq!(form.height_inches, "9");
        assert!(form.height_cm.is_empty());

        // Resubmitting in imperial lands within display rounding of the original
        let again = run_calculation(&form, UnitSystem::Imperial).unwrap();
        assert!((again.request.biometrics.weight_kg - 70.0).abs() < 0.05);
        assert!((again.request.biometrics.height_cm - 175.0).abs() <= units::INCHES_TO_CM);
    }

    #[test]
    fn test_convert_for_display() {
        let outcome = run_calculation(&metric_form(), UnitSystem::Metric).unwrap();

        let imperial = convert_for_display(&outcome.request, Some(&outcome.result), UnitSystem::Imperial);
        assert_eq!(imperial.weight, "154.3 lbs");
        assert_eq!(imperial.height, "5 ft 9 in");
        assert_eq!(imperial.bmr.as_deref(), Some("1649"));
        assert_eq!(imperial.tdee.as_deref(), Some("1979"));
        assert_eq!(imperial.exercise_target_per_day.as_deref(), Some("22"));

        let metric = convert_for_display(&outcome.request, None, UnitSystem::Metric);
        assert_eq!(metric.weight, "70 kg");
        assert_eq!(metric.height, "175 cm");
        assert!(metric.bmr.is_none());
    }

    #[test]
    fn test_convert_for_storage() {
        assert_eq!(
            convert_for_storage(DisplayMeasurement::Weight(70.0), UnitSystem::Metric).unwrap(),
            CanonicalValue::Kilograms(70.0)
        );

        match convert_for_storage(DisplayMeasurement::Weight(100.0), UnitSystem::Imperial).unwrap() {
            CanonicalValue::Kilograms(kg) => assert_close(kg, 45.3592),
            other => panic!("expected kilograms, got {:?}", other),
        }

        let height = DisplayMeasurement::Height(HeightEntry::FeetInches(HeightImperial {
            feet: 6,
            inches: 0,
        }));
        match convert_for_storage(height, UnitSystem::Imperial).unwrap() {
            CanonicalValue::Centimeters(cm) => assert_close(cm, 182.88),
            other => panic!("expected centimeters, got {:?}", other),
        }

        let kg = convert_for_storage(DisplayMeasurement::Weight(154.3), UnitSystem::Imperial)
            .unwrap()
            .value();
        assert!((kg - 70.0).abs() < 0.05);
    }

    #[test]
    fn test_convert_for_storage_rejects_invalid() {
        assert!(matches!(
            convert_for_storage(DisplayMeasurement::Weight(0.0), UnitSystem::Imperial),
            Err(Error::Validation(_))
        ));
        assert!(convert_for_storage(DisplayMeasurement::Weight(f64::NAN), UnitSystem::Metric).is_err());
        assert!(matches!(
            convert_for_storage(DisplayMeasurement::Weight(1e308), UnitSystem::Metric),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            convert_for_storage(
                DisplayMeasurement::Height(HeightEntry::FeetInches(HeightImperial {
                    feet: 178_956_971,
                    inches: 0
                })),
                UnitSystem::Imperial
            ),
            Err(Error::Validation(_))
        ));
        assert!(convert_for_storage(
            DisplayMeasurement::Height(HeightEntry::Centimeters(-5.0)),
            UnitSystem::Metric
        )
        .is_err());
        assert!(convert_for_storage(
            DisplayMeasurement::Height(HeightEntry::FeetInches(HeightImperial {
                feet: 5,
                inches: 13
            })),
            UnitSystem::Imperial
        )
        .is_err());
    }
}
