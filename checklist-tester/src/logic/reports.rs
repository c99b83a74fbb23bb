use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use checklist_core::MaskResolution;

use super::{ChecklistSnapshot, ScenarioResult};

#[derive(Serialize)]
struct JsonReport<'a> {
    checklist: &'a ChecklistSnapshot,
    scenarios: &'a [ScenarioResult],
}

fn progress_cell(completed: f32, onboard: f32, total: f32) -> String {
    if onboard > 0.0 {
        format!("{completed:.1} (+{onboard:.1}) / {total:.1}")
    } else {
        format!("{completed:.1} / {total:.1}")
    }
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 100.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    (passed as f64 / results.len() as f64) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    snapshot: &ChecklistSnapshot,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "🔬 Science Checklist".bright_cyan().bold())?;
    writeln!(out, "{}", "====================".cyan())?;
    writeln!(out, "View: {}", snapshot.display_mode_label())?;
    if !snapshot.query.is_empty() {
        writeln!(out, "Query: {}", snapshot.query.bright_white())?;
    }
    writeln!(
        out,
        "Complete: {}/{} ({} enumerated)",
        snapshot.complete_count.to_string().green(),
        snapshot.total_count,
        snapshot.enumerated
    )?;
    writeln!(out)?;

    for entry in &snapshot.entries {
        let status = if entry.complete {
            "✅".green()
        } else if entry.onboard > 0.0 {
            "📦".yellow()
        } else {
            "⬜".normal()
        };
        writeln!(
            out,
            "{status} {:60} {}",
            entry.description,
            progress_cell(entry.completed, entry.onboard, entry.total).dimmed()
        )?;
    }

    for diagnostic in &snapshot.diagnostics {
        let message = match diagnostic.resolution {
            MaskResolution::Recovered(_) => format!(
                "masks for {} recovered from {}",
                diagnostic.experiment_id,
                diagnostic.module.as_deref().unwrap_or("-")
            ),
            MaskResolution::Unrestricted => format!(
                "{} has no masks; shown in every situation",
                diagnostic.experiment_id
            ),
        };
        writeln!(out, "⚠️  {}", message.yellow())?;
    }

    if results.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "{}", "📊 Scenario Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Total scenarios: {}", results.len())?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (results.len() - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{} {} ({:?})", status, result.scenario_name.bold(), result.duration)?;
        for failure in &result.failures {
            writeln!(out, "     • {}", failure.red())?;
        }
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    snapshot: &ChecklistSnapshot,
    results: &[ScenarioResult],
) -> Result<()> {
    let report = JsonReport {
        checklist: snapshot,
        scenarios: results,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    snapshot: &ChecklistSnapshot,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(out, "# Science Checklist\n")?;
    writeln!(out, "- **View**: {}", snapshot.display_mode_label())?;
    if !snapshot.query.is_empty() {
        writeln!(out, "- **Query**: `{}`", snapshot.query)?;
    }
    writeln!(
        out,
        "- **Complete**: {}/{}\n",
        snapshot.complete_count, snapshot.total_count
    )?;

    writeln!(out, "| | Experiment | Science |")?;
    writeln!(out, "|---|---|---|")?;
    for entry in &snapshot.entries {
        let status = if entry.complete { "✅" } else { "" };
        writeln!(
            out,
            "| {status} | {} | {} |",
            entry.description,
            progress_cell(entry.completed, entry.onboard, entry.total)
        )?;
    }

    if results.is_empty() {
        return Ok(());
    }

    writeln!(out, "\n## Scenarios\n")?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {} {}\n", status, result.scenario_name)?;
        writeln!(out, "- **Time**: {:?}", result.duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
