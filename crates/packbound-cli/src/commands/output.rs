//! Shared output formatting for run results.

use anyhow::Result;
use packbound_core::{RunResult, ViolationType};

use crate::OutputFormat;

/// Print a run result in the specified format.
pub fn print(result: &RunResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
    }
    Ok(())
}

fn print_text(result: &RunResult) {
    for offense in &result.offenses {
        let label = match offense.violation_type {
            ViolationType::Privacy => "\x1b[31mprivacy\x1b[0m",
            ViolationType::Dependency => "\x1b[33mdependency\x1b[0m",
        };
        println!(
            "{} violation at {}:{}",
            label,
            offense.file.display(),
            offense.location,
        );
        println!("  {}", offense.message);
        println!();
    }

    for failure in &result.parse_failures {
        println!(
            "\x1b[31mparse failure\x1b[0m in {}: {}",
            failure.file.display(),
            failure.message
        );
    }
    if !result.parse_failures.is_empty() {
        println!();
    }

    let summary_color = if result.is_success() {
        "\x1b[32m"
    } else {
        "\x1b[31m"
    };
    println!(
        "{}Found {} privacy violation(s), {} dependency violation(s), \
         {} parse failure(s) in {} file(s)\x1b[0m",
        summary_color,
        result.count_of(ViolationType::Privacy),
        result.count_of(ViolationType::Dependency),
        result.parse_failures.len(),
        result.files_checked
    );
}

fn print_json(result: &RunResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &RunResult) {
    for offense in &result.offenses {
        println!(
            "{}:{}: {} [{}]",
            offense.file.display(),
            offense.location,
            offense.message,
            offense.violation_type,
        );
    }
    for failure in &result.parse_failures {
        println!(
            "{}: parse failure: {}",
            failure.file.display(),
            failure.message
        );
    }
}
