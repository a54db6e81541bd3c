//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, BufRead, Write};

use crate::domain::BumpType;
use crate::error::{ReleaseError, Result};
use crate::pipeline::{BumpRequest, BumpResolver};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_configurations, display_error, display_outcome, display_plan, display_remote_status,
    display_status, display_success, display_warning,
};

/// Map a 1-based menu answer to a choice; empty input picks the first.
fn parse_selection<T: Copy>(input: &str, choices: &[T]) -> Option<T> {
    let selection = input.trim();
    let index = if selection.is_empty() {
        1
    } else {
        selection.parse::<usize>().ok()?
    };
    if index > 0 && index <= choices.len() {
        Some(choices[index - 1])
    } else {
        None
    }
}

/// Prompts user to pick a bump type from the offered choices.
///
/// With a single choice it is returned without prompting. Otherwise a
/// numbered list is shown; Enter picks the first entry. Accepts either the
/// number or the bump name.
pub fn select_bump(request: &BumpRequest<'_>) -> Result<BumpType> {
    if request.choices.len() == 1 {
        return Ok(request.choices[0]);
    }

    println!(
        "\n{}",
        console::style(format!(
            "Bump type for '{}':",
            request.configuration.key
        ))
        .bold()
    );
    for (i, bump) in request.choices.iter().enumerate() {
        let preview = match request.remote {
            Some(remote) => format!(" -> {}", remote.next(*bump, request.first_build)?),
            None => String::new(),
        };
        println!("  {}. {}{}", i + 1, bump, preview);
    }

    print!(
        "\nSelect a bump type (1-{}) [default: 1]: ",
        request.choices.len()
    );
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;

    if let Ok(bump) = input.trim().parse::<BumpType>() {
        if request.choices.contains(&bump) {
            return Ok(bump);
        }
    }
    parse_selection(&input, request.choices)
        .ok_or_else(|| ReleaseError::config(format!("Invalid selection '{}'", input.trim())))
}

/// Resolver asking on the terminal
pub struct PromptResolver;

impl BumpResolver for PromptResolver {
    fn resolve(&mut self, request: &BumpRequest<'_>) -> Result<BumpType> {
        select_bump(request)
    }
}

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Accepts "y" or "yes" (case-insensitive). Default is "no".
pub fn confirm_action(prompt: &str) -> Result<bool> {
    print!("\n{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHOICES: [BumpType; 3] = [BumpType::Minor, BumpType::Patch, BumpType::Build];

    #[test]
    fn test_parse_selection_default() {
        assert_eq!(parse_selection("\n", &CHOICES), Some(BumpType::Minor));
    }

    #[test]
    fn test_parse_selection_index() {
        assert_eq!(parse_selection("3\n", &CHOICES), Some(BumpType::Build));
    }

    #[test]
    fn test_parse_selection_out_of_range() {
        assert_eq!(parse_selection("0", &CHOICES), None);
        assert_eq!(parse_selection("4", &CHOICES), None);
        assert_eq!(parse_selection("two", &CHOICES), None);
    }
}
