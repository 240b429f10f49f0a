//! Console rendering of an evaluation report.

use console::style;

use crate::api::InterviewReport;

/// Prints a fetched report to stdout.
pub fn render_report(report: &InterviewReport, candidate_name: Option<&str>) {
    println!();
    match candidate_name {
        Some(name) => println!("{}", style(format!(" Interview report - {name} ")).on_white().black()),
        None => println!("{}", style(" Interview report ").on_white().black()),
    }
    println!();

    println!(
        "  {} {}",
        style("Overall score:").bold(),
        style(format!("{:.1}/10", report.overall_score)).bold().cyan()
    );
    println!();
    println!("  {}", report.summary);

    if !report.criteria.is_empty() {
        println!();
        println!("  {}", style("Criteria").bold());
        for criterion in &report.criteria {
            println!(
                "   {} {} - {}",
                style(format!("{:.1}", criterion.score)).cyan(),
                style(&criterion.name).bold(),
                criterion.feedback
            );
        }
    }

    if !report.strengths.is_empty() {
        println!();
        println!("  {}", style("Strengths").bold().green());
        for strength in &report.strengths {
            println!("   • {strength}");
        }
    }

    if !report.improvements.is_empty() {
        println!();
        println!("  {}", style("Areas to improve").bold().yellow());
        for improvement in &report.improvements {
            println!("   • {improvement}");
        }
    }

    println!();
    println!(
        "  {} {}",
        style("Recommendation:").bold(),
        report.recommendation
    );
    println!();
}
