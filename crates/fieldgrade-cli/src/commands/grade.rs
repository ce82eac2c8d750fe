//! The `fieldgrade grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use fieldgrade_core::definition::parse_exercise;
use fieldgrade_core::grading::{grade_all, load_submissions, merge_teams, SubmissionResult};
use fieldgrade_core::report::GradingReport;
use fieldgrade_core::RuleEvaluator;

use crate::config::load_config_from;

pub fn execute(
    exercise_path: PathBuf,
    submission_paths: Vec<PathBuf>,
    summable: Option<String>,
    output: Option<PathBuf>,
    format: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        !submission_paths.is_empty(),
        "at least one submissions file is required"
    );

    let config = load_config_from(config_path.as_deref())?;
    let output = output.unwrap_or_else(|| config.output_dir.clone());
    let format = format.unwrap_or_else(|| config.default_format.clone());

    let exercise = parse_exercise(&exercise_path)?;

    // Summable keys: exercise, then config, then command line
    let mut summable_keys = exercise.exercise.summable_keys.clone();
    summable_keys.extend(config.summable_keys.iter().cloned());
    if let Some(s) = &summable {
        summable_keys.extend(
            s.split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
        );
    }

    // Entries are not merged across teams, so one engine sees every submission
    let mut assertions = exercise
        .build_assertion_engine()
        .with_context(|| format!("invalid exercise definition: {}", exercise_path.display()))?;

    // One evaluator per team so each team's statistics stay separate until merged
    let mut teams: Vec<RuleEvaluator> = Vec::new();
    let mut results: Vec<SubmissionResult> = Vec::new();
    for path in &submission_paths {
        let submissions = load_submissions(path)?;
        let mut evaluator = exercise
            .build_evaluator()
            .with_context(|| format!("invalid exercise definition: {}", exercise_path.display()))?;

        tracing::info!(
            "grading {} submission(s) from {}",
            submissions.len(),
            path.display()
        );
        results.extend(
            grade_all(&mut evaluator, &mut assertions, &submissions)
                .with_context(|| format!("grading aborted for {}", path.display()))?,
        );
        teams.push(evaluator);
    }

    let team_count = teams.len();
    let combined = if team_count == 1 {
        teams.remove(0)
    } else {
        let refs: Vec<&RuleEvaluator> = teams.iter().collect();
        merge_teams(&refs, &summable_keys)
    };

    let report = GradingReport::build(&exercise, &combined, &assertions, results, team_count);

    let formats: Vec<&str> = if format == "all" {
        vec!["text", "json"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "text" => print_summary(&report),
            "json" => {
                std::fs::create_dir_all(&output)?;
                let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
                let path = output.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn print_summary(report: &GradingReport) {
    use comfy_table::{Cell, Table};

    println!(
        "Exercise: {} ({} submissions, {} team(s))",
        report.exercise.name,
        report.submissions.len(),
        report.teams
    );

    let mut submissions = Table::new();
    submissions.set_header(vec!["Submission", "Points", "Failures"]);
    for s in &report.submissions {
        submissions.add_row(vec![
            Cell::new(&s.id),
            Cell::new(format!("{}/{}", s.points, s.max_points)),
            Cell::new(s.explanations.join("\n")),
        ]);
    }
    println!("{submissions}");

    let mut rules = Table::new();
    rules.set_header(vec!["Rule", "Label", "Passed", "Observed", "Pass %", "Distinct"]);
    for stats in &report.rules {
        rules.add_row(vec![
            Cell::new(&stats.key),
            Cell::new(&stats.label),
            Cell::new(stats.passed),
            Cell::new(stats.observed),
            Cell::new(format!("{:.1}%", stats.pass_rate * 100.0)),
            Cell::new(stats.distinct_values),
        ]);
    }
    println!("{rules}");

    if !report.entries.is_empty() {
        let mut entries = Table::new();
        entries.set_header(vec!["Entry", "Label", "Passed", "Observed", "Pass %"]);
        for stats in &report.entries {
            entries.add_row(vec![
                Cell::new(&stats.key),
                Cell::new(&stats.label),
                Cell::new(stats.passed),
                Cell::new(stats.observed),
                Cell::new(format!("{:.1}%", stats.pass_rate * 100.0)),
            ]);
        }
        println!("{entries}");
    }

    println!(
        "Average points: {:.2} / {} ({} perfect)",
        report.average_points(),
        report.exercise.max_points,
        report.perfect_count()
    );
}
