//! Report rendering shared by `index` and `check`.

use anyhow::Result;
use coursenav_core::{IndexError, Indexer, SiteIndex};
use coursenav_types::IndexReport;

/// Run the indexer; on failure, print the failure report when JSON was requested
pub fn run_indexer(indexer: &Indexer, json: bool) -> Result<SiteIndex> {
    match indexer.run() {
        Ok(index) => Ok(index),
        Err(err) => {
            if json {
                print_json(&err.report())?;
            } else {
                print_failure(&err);
            }
            Err(err.into())
        }
    }
}

pub fn print_json(report: &IndexReport) -> Result<()> {
    let payload = serde_json::to_string_pretty(report)?;
    println!("{}", payload);
    Ok(())
}

/// Human-readable summary followed by one line per issue
pub fn print_summary(report: &IndexReport) {
    println!(
        "Indexed {} documents, {} questions, {} issue(s)",
        report.documents,
        report.questions,
        report.issue_count()
    );
    print_issues(report);
}

fn print_failure(err: &IndexError) {
    let report = err.report();
    print_issues(&report);
    if let Some(fatal) = &report.fatal_error {
        println!("- fatal: {}", fatal);
    }
}

fn print_issues(report: &IndexReport) {
    for source in &report.missing_front_matter {
        println!("- missing front matter: {}", source);
    }
    for entry in &report.invalid_front_matter {
        println!("- invalid front matter: {}: {}", entry.source, entry.reason);
    }
    for warning in &report.warnings {
        println!("- {} ({}): {}", warning.code, warning.source, warning.message);
    }
    for quiz in &report.malformed_quizzes {
        println!(
            "- malformed quiz: {} question {}: {}",
            quiz.path, quiz.question_index, quiz.reason
        );
    }
}
