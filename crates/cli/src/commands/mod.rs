//! Command implementations.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod local;

use std::io::{self, BufRead, Write};

use thiserror::Error;

use poojabdi_admin::AdminError;
use poojabdi_storefront::StorefrontError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("Product not found in catalog: {0}")]
    UnknownProduct(poojabdi_core::ProductId),

    #[error("Invalid setting {0:?}, expected key=value")]
    InvalidSetting(String),

    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

/// Write command output to stdout.
fn emit(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}

/// Ask a yes/no question on the terminal. Anything but `y`/`yes` declines.
fn confirm_on_terminal(prompt: &str) -> bool {
    let mut stderr = io::stderr().lock();
    if write!(stderr, "{prompt} [y/N] ").and_then(|()| stderr.flush()).is_err() {
        return false;
    }

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }
}
