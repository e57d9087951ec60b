//! Word-by-word reveal of a finished answer.
//!
//! The endpoint returns the whole answer at once; the reveal replays it as a
//! sequence of small text chunks with a fixed pause before each one.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(50);

/// Split `answer` into append-only chunks.
///
/// Tokens are separated by single spaces and empty tokens are kept, so
/// concatenating the chunks always reproduces `answer` exactly. Every chunk
/// but the first carries its leading space.
pub fn chunks(answer: &str) -> Vec<String> {
    answer
        .split(' ')
        .enumerate()
        .map(|(i, word)| if i == 0 { word.to_string() } else { format!(" {}", word) })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    Cancelled,
}

/// Feed `answer` into `sink` one chunk at a time, sleeping `delay` before
/// each chunk. Stops without emitting anything further once `cancel` fires.
pub async fn reveal<F>(
    answer: &str,
    delay: Duration,
    cancel: &CancellationToken,
    mut sink: F,
) -> RevealOutcome
where
    F: FnMut(String) -> bool,
{
    for chunk in chunks(answer) {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return RevealOutcome::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }
        // Sink gone means nobody is rendering any more
        if !sink(chunk) {
            return RevealOutcome::Cancelled;
        }
    }
    RevealOutcome::Completed
}
