// Message payload resolution: positional argument, --file, or stdin

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

pub fn read_message(message: Option<&str>, file: Option<&Path>) -> Result<String> {
    let text = match (message, file) {
        (Some(text), _) if text != "-" => text.to_string(),
        (_, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read message file {}", path.display()))?,
        _ => read_stdin()?,
    };

    if text.trim().is_empty() {
        anyhow::bail!("Message is empty");
    }

    Ok(text)
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read message from stdin")?;
    Ok(text)
}
