use colored::Colorize;
use std::io::{self, Write};

use crate::wire::{GenerationRecord, Issue, Severity};

pub fn read_prompt() -> io::Result<String> {
    print!("Enter your testimonial request: ");
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

fn header(title: &str) {
    println!("\n=== {} ===", title.bold());
}

fn severity_tag(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::High => "[HIGH]".red().bold(),
        Severity::Medium => "[MEDIUM]".yellow().bold(),
        Severity::Low => "[LOW]".green().bold(),
    }
}

fn show_issues(issues: &[Issue]) {
    if issues.is_empty() {
        println!("(no issues reported)");
        return;
    }
    for (i, issue) in issues.iter().enumerate() {
        println!(
            "{}. {}  {} — {}",
            i + 1,
            severity_tag(issue.severity),
            issue.category,
            issue.description
        );
        if !issue.suggested_fix.is_empty() {
            println!("   fix: {}", issue.suggested_fix);
        }
    }
}

pub fn show_record(record: &GenerationRecord) {
    if let Some(enhanced) = &record.enhanced_prompt {
        header("Enhanced Prompt");
        println!("{enhanced}");
    }
    if let Some(description) = &record.description {
        header("Generated Description");
        println!("{description}");
    }
    if let Some(issues) = &record.issues {
        header("Critique");
        show_issues(issues);
    }
    if let Some(svg) = &record.svg_source {
        header("Final SVG");
        println!("{svg}");
        if record.unrepaired {
            println!(
                "\n{} repair pass failed; this is the pre-repair version",
                "note:".yellow().bold()
            );
        }
    }
    if let Some(error) = &record.error {
        header("Error");
        println!("{}", error.red());
    }
}
