#![forbid(unsafe_code)]

//! Core domain model and calculation engine for fitcalc.
//!
//! This crate provides:
//! - Domain types (unit systems, biometrics, activity levels, goals)
//! - Unit conversion and display formatting
//! - Energy formulas (BMR, TDEE, exercise target, MET burn)
//! - Calculation sessions over raw form input
//! - Preference persistence and configuration

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod units;
pub mod energy;
pub mod session;
pub mod preferences;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use energy::{
    calculate_bmr, calculate_exercise_target, calculate_tdee, estimate_calories_burned,
};
pub use session::{
    convert_for_display, convert_for_storage, run_calculation, CalculationSession,
    CanonicalValue, DisplayMeasurement, DisplayStrings, HeightEntry, RawFormInput,
    SessionOutcome, SessionState,
};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, SavedInputs};
