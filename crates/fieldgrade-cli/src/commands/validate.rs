//! The `fieldgrade validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use fieldgrade_core::definition::{load_exercises, validate_exercise};

pub fn execute(exercise_path: PathBuf) -> Result<()> {
    let exercises = load_exercises(&exercise_path)?;

    let mut total_warnings = 0;

    for def in &exercises {
        println!(
            "Exercise: {} ({} rules, {} entries)",
            def.exercise.name,
            def.rules.len(),
            def.entries.len()
        );

        // configuration errors are fatal, warnings are not
        def.build_evaluator()
            .with_context(|| format!("exercise {} has an invalid rule", def.exercise.id))?;
        def.build_assertion_engine()
            .with_context(|| format!("exercise {} has an invalid entry", def.exercise.id))?;

        let warnings = validate_exercise(def);
        for w in &warnings {
            let prefix = w
                .key
                .as_ref()
                .map(|key| format!("  [{key}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All exercises valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
