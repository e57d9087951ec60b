//! One question/answer round trip as a single cancellable task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::ask::AskBackend;
use crate::reveal::{reveal, RevealOutcome};
use crate::session::{ChatEvent, ChatEventKind, Submission};

/// Handle to a running exchange
#[derive(Debug)]
pub struct ExchangeHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ExchangeHandle {
    /// Stop the request and the reveal. Nothing else is sent afterward.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.task.abort();
    }

    /// Wait for the task to end, cancelled or not
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Dispatch `submission` to `backend` and reveal the answer, reporting every
/// step on `events`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_exchange(
    backend: Arc<dyn AskBackend>,
    submission: Submission,
    delay: Duration,
    events: UnboundedSender<ChatEvent>,
) -> ExchangeHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let task = tokio::spawn(async move {
        run_exchange(backend.as_ref(), submission, delay, &events, &token).await;
    });
    ExchangeHandle { cancel, task }
}

async fn run_exchange(
    backend: &dyn AskBackend,
    submission: Submission,
    delay: Duration,
    events: &UnboundedSender<ChatEvent>,
    cancel: &CancellationToken,
) {
    let Submission { epoch, query } = submission;
    let send = |kind: ChatEventKind| events.send(ChatEvent::new(epoch, kind)).is_ok();

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("exchange cancelled while waiting for answer");
            return;
        }
        result = backend.ask(&query) => result,
    };

    let answer = match result {
        Ok(answer) => answer,
        Err(error) => {
            send(ChatEventKind::Failed { error });
            return;
        }
    };

    if !send(ChatEventKind::Answered {
        answer: answer.clone(),
    }) {
        return;
    }

    let outcome = reveal(&answer, delay, cancel, |text| {
        send(ChatEventKind::Chunk { text })
    })
    .await;

    match outcome {
        RevealOutcome::Completed => {
            send(ChatEventKind::RevealComplete);
        }
        RevealOutcome::Cancelled => tracing::debug!("reveal cancelled"),
    }
}
