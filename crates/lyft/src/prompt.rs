//! Interactive input.

use std::io::{BufRead, Write};

use anyhow::Result;

/// Print `prompt` and read one trimmed line from stdin.
pub fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Interpret a yes/no answer; anything but an explicit no is yes.
pub fn parse_yes(input: &str) -> bool {
    !matches!(input.trim().to_lowercase().as_str(), "n" | "no")
}

/// Ask a `[Y/n]` question. Unreadable input counts as no.
pub fn confirm(question: &str) -> bool {
    match read_line(&format!("{question} [Y/n]: ")) {
        Ok(answer) => parse_yes(&answer),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read answer");
            false
        }
    }
}
