//! Interactive yes/no prompt on the controlling terminal

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use tracing::warn;

use migrator::migration::{CancellationSignal, Confirmation};

/// Asks on stderr and reads stdin; a cancelled run answers no at once.
///
/// The stdin read itself cannot be interrupted, so the blocking thread stays
/// parked until the process exits.
pub struct StdinConfirmation {
    cancel: CancellationSignal,
}

impl StdinConfirmation {
    pub fn new(cancel: CancellationSignal) -> Self {
        Self { cancel }
    }
}

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm(&self, message: &str) -> bool {
        let message = message.to_string();
        answer_unless_cancelled(&self.cancel, move || ask(&message)).await
    }
}

async fn answer_unless_cancelled<F>(cancel: &CancellationSignal, read: F) -> bool
where
    F: FnOnce() -> io::Result<bool> + Send + 'static,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("Run cancelled while waiting for an answer, treating it as no");
            false
        }
        answer = tokio::task::spawn_blocking(read) => match answer {
            Ok(Ok(answer)) => answer,
            Ok(Err(err)) => {
                warn!("Could not read an answer, treating it as no: {}", err);
                false
            }
            Err(err) => {
                warn!("Confirmation prompt failed, treating it as no: {}", err);
                false
            }
        },
    }
}

fn ask(message: &str) -> io::Result<bool> {
    let mut stderr = io::stderr().lock();
    write!(stderr, "{} [y/N] ", message)?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(is_yes(&line))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_explicit_yes_accepts() {
        assert!(is_yes("y\n"));
        assert!(is_yes("  YES \n"));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }

    #[tokio::test]
    async fn test_cancelled_run_answers_no_without_waiting() {
        let cancel = CancellationSignal::new();
        cancel.cancel();

        let answer = answer_unless_cancelled(&cancel, || {
            std::thread::sleep(std::time::Duration::from_millis(200));
            Ok(true)
        })
        .await;

        assert!(!answer);
    }

    #[tokio::test]
    async fn test_answer_passes_through_when_not_cancelled() {
        let cancel = CancellationSignal::new();

        assert!(answer_unless_cancelled(&cancel, || Ok(true)).await);
        assert!(!answer_unless_cancelled(&cancel, || Ok(false)).await);

        let unreadable = answer_unless_cancelled(&cancel, || {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))
        })
        .await;
        assert!(!unreadable);
    }

    #[tokio::test]
    async fn test_cancel_during_read_answers_no() {
        let cancel = CancellationSignal::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let answer = answer_unless_cancelled(&cancel, || {
            std::thread::sleep(std::time::Duration::from_millis(500));
            Ok(true)
        })
        .await;

        assert!(!answer);
    }
}
