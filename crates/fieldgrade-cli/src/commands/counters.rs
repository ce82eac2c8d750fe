//! The `fieldgrade counters` command.

use std::path::PathBuf;

use anyhow::Result;

use fieldgrade_core::report::GradingReport;

pub fn execute(report_path: PathBuf, key: Option<String>) -> Result<()> {
    let report = GradingReport::load_json(&report_path)?;

    if let Some(k) = &key {
        anyhow::ensure!(
            report.counter_lines(k).is_some(),
            "no counters for key '{k}'. Available: {:?}",
            report.counters.keys().collect::<Vec<_>>()
        );
    }

    println!(
        "Exercise: {} ({} submissions)",
        report.exercise.name,
        report.submissions.len()
    );
    print!("{}", report.counters_text(key.as_deref()));

    Ok(())
}
