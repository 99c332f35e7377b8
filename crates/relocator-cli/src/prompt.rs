use relocator_core::relocate::{Confirm, PendingChange};
use std::io::{BufRead, Write};

/// Asks on the terminal before a folder is moved.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, change: &PendingChange) -> bool {
        let mut err = std::io::stderr();
        let _ = writeln!(err, "Change status of {}: {} -> {}", change.number, change.from, change.to);
        let _ = writeln!(err, "  from: {}", change.source.display());
        let _ = writeln!(err, "  to:   {}", change.destination.display());
        let _ = write!(err, "Move folder? [y/N] ");
        let _ = err.flush();

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(_) => is_yes(&line),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read confirmation");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
