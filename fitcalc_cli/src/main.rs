use clap::{Args, Parser, Subcommand};
use fitcalc_core::preferences::{self, SavedInputs};
use fitcalc_core::session::convert_for_display_with;
use fitcalc_core::units::format_weight;
use fitcalc_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fitcalc")]
#[command(about = "Daily energy expenditure and exercise target calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this measurement system for one run (metric, imperial)
    #[arg(long, global = true)]
    system: Option<UnitSystem>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate BMR, TDEE and the daily exercise target (default)
    Calc(CalcArgs),

    /// Show or set the preferred measurement system
    Units {
        /// New measurement system (metric, imperial)
        #[arg(value_name = "SYSTEM")]
        new_system: Option<UnitSystem>,
    },

    /// Show the saved inputs in the active measurement system
    Show,

    /// Forget the saved inputs
    Clear,

    /// Estimate calories burned by an exercise from its MET value
    Burn {
        /// Metabolic equivalent of the exercise
        #[arg(long)]
        met: f64,

        /// Duration in minutes
        #[arg(long)]
        minutes: f64,

        /// Body weight in the active unit (defaults to the saved weight)
        #[arg(long)]
        weight: Option<f64>,
    },
}

/// Form fields; anything left out comes from the saved inputs
#[derive(Args, Default)]
struct CalcArgs {
    /// Body weight (kg or lbs, per measurement system)
    #[arg(long)]
    weight: Option<String>,

    /// Height in cm (metric system)
    #[arg(long)]
    height_cm: Option<String>,

    /// Height, whole feet (imperial system)
    #[arg(long)]
    feet: Option<String>,

    /// Height, remaining whole inches 0-11 (imperial system)
    #[arg(long)]
    inches: Option<String>,

    /// Age in whole years
    #[arg(long)]
    age: Option<String>,

    /// Biological sex (male, female)
    #[arg(long)]
    sex: Option<String>,

    /// Activity level (sedentary, lightly_active, moderately_active, very_active, extra_active)
    #[arg(long)]
    activity: Option<String>,

    /// Average daily calorie intake
    #[arg(long)]
    intake: Option<String>,

    /// Goal (maintain, lose)
    #[arg(long)]
    goal: Option<String>,

    /// Desired daily deficit in calories (goal = lose)
    #[arg(long)]
    deficit: Option<String>,

    /// Do not save these inputs for next time
    #[arg(long)]
    no_save: bool,
}

fn main() -> ExitCode {
    // Initialize logging
    fitcalc_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_validation() {
                eprintln!("Fix the value with its flag, e.g. `fitcalc calc --weight 70`.");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    let store_path = config.data.preferences_path();
    tracing::debug!("Using preference store {:?}", store_path);

    let mut store = FilePreferenceStore::open(store_path);
    let system = cli
        .system
        .unwrap_or_else(|| preferences::load_unit_system(&store));

    match cli.command {
        Some(Commands::Calc(args)) => cmd_calc(&mut store, system, args, &config),
        Some(Commands::Units { new_system }) => cmd_units(&mut store, new_system),
        Some(Commands::Show) => cmd_show(&store, system, &config),
        Some(Commands::Clear) => cmd_clear(&mut store),
        Some(Commands::Burn {
            met,
            minutes,
            weight,
        }) => cmd_burn(&store, system, met, minutes, weight, &config),
        None => {
            // Default to recalculating from the saved inputs
            cmd_calc(&mut store, system, CalcArgs::default(), &config)
        }
    }
}

fn cmd_calc(
    store: &mut FilePreferenceStore,
    system: UnitSystem,
    args: CalcArgs,
    config: &Config,
) -> Result<()> {
    let mut form = match preferences::load_saved_inputs(&*store) {
        Some(saved) => RawFormInput::prefill(&saved.request, system),
        None => RawFormInput {
            desired_deficit: config.calculation.default_desired_deficit.to_string(),
            ..RawFormInput::default()
        },
    };

    match system {
        UnitSystem::Metric if args.feet.is_some() || args.inches.is_some() => {
            tracing::warn!("--feet/--inches are ignored in the metric system");
        }
        UnitSystem::Imperial if args.height_cm.is_some() => {
            tracing::warn!("--height-cm is ignored in the imperial system");
        }
        _ => {}
    }

    let overrides = [
        (&mut form.weight, args.weight),
        (&mut form.height_cm, args.height_cm),
        (&mut form.height_feet, args.feet),
        (&mut form.height_inches, args.inches),
        (&mut form.age_years, args.age),
        (&mut form.sex, args.sex),
        (&mut form.activity_level, args.activity),
        (&mut form.intake, args.intake),
        (&mut form.goal, args.goal),
        (&mut form.desired_deficit, args.deficit),
    ];
    for (field, value) in overrides {
        if let Some(value) = value {
            *field = value;
        }
    }

    let outcome = run_calculation(&form, system)?;
    display_outcome(&outcome, system, config);

    if args.no_save {
        println!("\n[Inputs not saved]");
    } else {
        preferences::save_inputs(store, &outcome.request)?;
        println!("\n✓ Inputs saved");
    }

    Ok(())
}

fn cmd_units(store: &mut FilePreferenceStore, new_system: Option<UnitSystem>) -> Result<()> {
    match new_system {
        Some(system) => {
            preferences::save_unit_system(store, system)?;
            println!("✓ Measurement system set to {}", system);
        }
        None => {
            let system = preferences::load_unit_system(&*store);
            println!(
                "Measurement system: {} (weight in {}, height in {})",
                system,
                system.weight_unit(),
                system.height_unit()
            );
        }
    }
    Ok(())
}

fn cmd_show(store: &FilePreferenceStore, system: UnitSystem, config: &Config) -> Result<()> {
    let Some(saved) = preferences::load_saved_inputs(store) else {
        println!("No saved inputs.");
        return Ok(());
    };

    display_saved(&saved, system, config);
    Ok(())
}

fn cmd_clear(store: &mut FilePreferenceStore) -> Result<()> {
    preferences::clear_saved_inputs(store)?;
    println!("✓ Cleared saved inputs");
    Ok(())
}

fn cmd_burn(
    store: &FilePreferenceStore,
    system: UnitSystem,
    met: f64,
    minutes: f64,
    weight: Option<f64>,
    config: &Config,
) -> Result<()> {
    // A typed weight is form input and must validate; only MET and duration
    // get the lenient zero-with-warning treatment
    let weight_kg = match weight {
        Some(w) => convert_for_storage(DisplayMeasurement::Weight(w), system)?.value(),
        None => preferences::load_saved_inputs(store)
            .map(|saved| saved.request.biometrics.weight_kg)
            .ok_or_else(|| {
                Error::Validation(
                    "No weight given and no saved inputs. Pass --weight.".into(),
                )
            })?,
    };

    let calories = estimate_calories_burned(met, weight_kg, minutes);
    println!(
        "Estimated burn: {} Calories (MET {} for {} min at {})",
        calories.round() as i64,
        met,
        minutes,
        format_weight(weight_kg, system.weight_unit(), config.display.weight_decimals)
    );
    Ok(())
}

fn display_outcome(outcome: &SessionOutcome, system: UnitSystem, config: &Config) {
    let shown = convert_for_display_with(
        &outcome.request,
        Some(&outcome.result),
        system,
        &config.display,
    );
    let bmr = shown.bmr.unwrap_or_default();
    let tdee = shown.tdee.unwrap_or_default();
    let target = shown.exercise_target_per_day.unwrap_or_default();

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  ESTIMATED RESULTS");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Weight: {}   Height: {}", shown.weight, shown.height);
    println!();
    println!("  Basal Metabolic Rate (BMR):      {} Calories/day", bmr);
    println!("  Est. Daily Expenditure (TDEE):   {} Calories/day", tdee);
    println!("  Target Exercise Burn Per Day:    {} Calories/day", target);
    println!();
    println!("  These are estimates (Mifflin-St Jeor). Actual needs vary;");
    println!("  consult a professional before major diet or exercise changes.");
}

fn display_saved(saved: &SavedInputs, system: UnitSystem, config: &Config) {
    let request = &saved.request;
    let shown = convert_for_display_with(request, None, system, &config.display);

    println!("Saved inputs ({}):", saved.saved_at.format("%Y-%m-%d %H:%M UTC"));
    println!("  Weight:         {}", shown.weight);
    println!("  Height:         {}", shown.height);
    println!("  Age:            {}", request.biometrics.age_years);
    println!("  Sex:            {}", request.biometrics.sex);
    println!("  Activity level: {}", request.activity_level);
    println!("  Daily intake:   {} Calories", request.intake);
    println!("  Goal:           {}", request.goal);
    if request.goal == Goal::Lose {
        println!("  Desired deficit: {} Calories/day", request.desired_deficit);
    }
}
