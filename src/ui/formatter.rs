//! Pure formatting functions for UI output.
//!
//! Everything the CLI prints goes through here; interactive prompts live in
//! the parent module.

use crate::domain::{BuildConfiguration, BumpType, VersionDescriptor};
use crate::pipeline::{ReleaseOutcome, ReleasePlan};
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a warning in yellow.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// One-line summary of the allowed bump types
pub fn format_bumps(bumps: &[BumpType]) -> String {
    bumps
        .iter()
        .map(|b| b.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display the configured build configurations.
pub fn display_configurations(configurations: &[BuildConfiguration]) {
    println!("{}", style("Configured build configurations:").bold());
    for configuration in configurations {
        println!(
            "  - {} ({}, scheme {}) bumps: {}",
            style(&configuration.key).cyan(),
            configuration.bundle_id,
            configuration.scheme,
            format_bumps(configuration.allowed_bumps())
        );
    }
}

/// Display the remote state of a configuration and what each allowed bump
/// would produce.
pub fn display_remote_status(
    configuration: &BuildConfiguration,
    remote: Option<&VersionDescriptor>,
    candidates: &[(BumpType, VersionDescriptor)],
) {
    println!(
        "\n{} {}",
        style("Build configuration").bold(),
        style(&configuration.key).cyan()
    );
    println!("  Bundle id: {}", configuration.bundle_id);
    match remote {
        Some(remote) => println!("  Remote:    {}", remote),
        None => println!("  Remote:    {}", style("nothing uploaded yet").dim()),
    }
    if !candidates.is_empty() {
        println!("  Next:");
        for (bump, next) in candidates {
            println!("    {:<6} -> {}", bump.as_str(), next);
        }
    }
}

/// Display the release plan before anything runs.
pub fn display_plan(plan: &ReleasePlan) {
    println!(
        "\n{} {}",
        style("Release plan for").bold(),
        style(&plan.configuration.key).cyan()
    );
    println!("  Bundle id: {}", plan.configuration.bundle_id);
    match &plan.remote {
        Some(remote) => println!("  From:      {}", style(remote).red()),
        None => println!("  From:      {}", style("(first release)").dim()),
    }
    println!("  To:        {}", style(&plan.next).green());
    println!("  Bump:      {}", plan.bump);
}

/// Display the result of a finished run.
pub fn display_outcome(outcome: &ReleaseOutcome) {
    match &outcome.artifacts {
        None => {
            display_status("Dry run: nothing was signed, built or uploaded");
        }
        Some(artifacts) => {
            if outcome.symbols_uploaded {
                display_success("Debug symbols uploaded");
            }
            display_success(&format!(
                "Uploaded {} as {}",
                artifacts.package.display(),
                outcome.plan.next
            ));
        }
    }
}
