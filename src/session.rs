use crate::assistant::Assistant;
use crate::completion::{Completion, CompletionService, ServiceUnavailable};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

type Outcome = Result<Completion, ServiceUnavailable>;

/// Drives an [`Assistant`] against a completion service.
///
/// The admitted request runs on a spawned task so the caller keeps handling
/// input; its outcome comes back on a channel and is applied by
/// [`Session::replied`]. Submission only goes through here, so an awaiting
/// assistant always has a request in flight.
pub struct Session {
    assistant: Assistant,
    service: Arc<dyn CompletionService>,
    in_flight: Option<mpsc::UnboundedReceiver<Outcome>>,
}

impl Session {
    pub fn new(assistant: Assistant, service: Arc<dyn CompletionService>) -> Self {
        Self {
            assistant,
            service,
            in_flight: None,
        }
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn open(&mut self) {
        self.assistant.open();
    }

    pub fn close(&mut self) {
        self.assistant.close();
    }

    pub fn toggle(&mut self) {
        self.assistant.toggle();
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.assistant.update_draft(text);
    }

    /// Submit the draft in the background. Returns whether it was admitted.
    pub fn submit(&mut self) -> bool {
        let Some(request) = self.assistant.submit() else {
            return false;
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let service = Arc::clone(&self.service);
        tokio::spawn(async move {
            let outcome = service.complete(request).await;
            let _ = tx.send(outcome);
        });
        self.in_flight = Some(rx);
        true
    }

    /// Wait for the in-flight outcome and apply it. Never completes while
    /// nothing is in flight, and is safe to cancel inside `select!`.
    pub async fn replied(&mut self) {
        let Some(rx) = self.in_flight.as_mut() else {
            return std::future::pending().await;
        };

        // A closed channel means the task died before sending.
        let outcome = rx
            .recv()
            .await
            .unwrap_or_else(|| Err(ServiceUnavailable::new("completion task ended without a result")));
        self.in_flight = None;
        self.assistant.resolve(outcome);
    }

    /// Wait for the in-flight request, if any, and apply it.
    #[allow(dead_code)]
    pub async fn settle(&mut self) {
        if self.in_flight.is_some() {
            self.replied().await;
        }
    }

    /// Submit and wait for the reply inline. Returns whether it was admitted.
    pub async fn submit_and_wait(&mut self) -> bool {
        let Some(request) = self.assistant.submit() else {
            return false;
        };
        debug!("awaiting completion inline");
        let outcome = self.service.complete(request).await;
        self.assistant.resolve(outcome);
        true
    }

    #[allow(dead_code)]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }
}
