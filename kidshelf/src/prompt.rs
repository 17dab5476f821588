//! Small stdin prompt helpers for the interactive commands.

use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Print a message and read one trimmed line from stdin.
pub fn line(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Yes/no confirmation, defaulting to no.
pub fn confirm(message: &str) -> Result<bool> {
    let answer = line(&format!("{} [y/N]: ", message))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Yes/no confirmation, defaulting to yes.
pub fn confirm_or_yes(message: &str) -> Result<bool> {
    let answer = line(&format!("{} [Y/n]: ", message))?;
    Ok(!matches!(answer.to_lowercase().as_str(), "n" | "no"))
}

/// Read a line, falling back to `default` on empty input.
pub fn line_or(message: &str, default: &str) -> Result<String> {
    let answer = line(message)?;
    if answer.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(answer)
    }
}
