//! Session: the single process-wide owner of the Application State Machine
//! and the chat transcript.
//!
//! The lock is never held across a model call: a run or a follow-up question
//! takes what it needs, releases the lock, awaits the model, then re-locks to
//! record the outcome. Outcomes that arrive for a run or a transcript that no
//! longer exists are dropped.

pub mod state;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::prompts::CHAT_FAILURE_MESSAGE;
use crate::analysis::{AnalysisError, AnalysisResult, Document, Evaluator, FollowUpClient};

pub use state::{ApplicationState, ChatTranscript, ChatTurn, Event, Role, Status, Transition};
use state::StateMachine;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    Started { run_id: Uuid },
    Ignored { reason: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    Answered { text: String },
    Ignored { reason: &'static str },
    /// The session was reset while the answer was pending.
    Discarded,
}

/// Serializable view of the session for the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub transcript: Vec<ChatTurn>,
    pub chat_pending: bool,
}

#[derive(Default)]
struct Inner {
    machine: StateMachine,
    transcript: ChatTranscript,
    chat_pending: bool,
    /// Bumped on every state change; a pending chat answer is only recorded
    /// if the epoch it started in is still current.
    epoch: u64,
}

impl Inner {
    fn apply(&mut self, event: Event) -> Transition {
        let transition = self.machine.apply(event);
        if transition.is_moved() {
            self.epoch += 1;
            self.transcript.clear();
            self.chat_pending = false;
        }
        transition
    }
}

pub struct Session {
    inner: Mutex<Inner>,
    evaluator: Evaluator,
    chat: FollowUpClient,
    run_timeout: Option<Duration>,
}

impl Session {
    pub fn new(evaluator: Evaluator, chat: FollowUpClient, run_timeout: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            evaluator,
            chat,
            run_timeout,
        }
    }

    /// Starts a run and waits for it to finish.
    #[cfg(test)]
    pub async fn analyze(&self, documents: Vec<Document>) -> SelectOutcome {
        let outcome = self.begin(documents.len()).await;
        if let SelectOutcome::Started { run_id } = outcome {
            self.execute(run_id, documents).await;
        }
        outcome
    }

    /// Starts a run on a background task and returns immediately.
    pub async fn submit(self: &Arc<Self>, documents: Vec<Document>) -> SelectOutcome {
        let outcome = self.begin(documents.len()).await;
        if let SelectOutcome::Started { run_id } = outcome {
            let session = Arc::clone(self);
            tokio::spawn(async move {
                session.execute(run_id, documents).await;
            });
        }
        outcome
    }

    async fn begin(&self, file_count: usize) -> SelectOutcome {
        let mut inner = self.inner.lock().await;
        match inner.apply(Event::Select { file_count }) {
            Transition::Moved { .. } => {
                let run_id = inner.machine.state().run_id().unwrap_or_default();
                info!("Analysis run {run_id} started with {file_count} document(s)");
                SelectOutcome::Started { run_id }
            }
            Transition::Ignored { reason, .. } => {
                info!("File selection ignored: {reason}");
                SelectOutcome::Ignored { reason }
            }
        }
    }

    async fn execute(&self, run_id: Uuid, documents: Vec<Document>) {
        let outcome = match self.run_timeout {
            Some(limit) => tokio::time::timeout(limit, self.evaluator.evaluate(documents))
                .await
                .unwrap_or(Err(AnalysisError::Timeout {
                    after_ms: limit.as_millis() as u64,
                })),
            None => self.evaluator.evaluate(documents).await,
        };

        let mut inner = self.inner.lock().await;
        if inner.machine.state().run_id() != Some(run_id) {
            warn!("Dropping outcome of stale analysis run {run_id}");
            return;
        }

        match outcome {
            Ok(result) => {
                info!(
                    "Analysis run {run_id} finished: {} candidate(s), best={}",
                    result.candidates.len(),
                    result.best_candidate_id
                );
                inner.apply(Event::Succeed(Arc::new(result)));
            }
            Err(e) => {
                error!("Analysis run {run_id} failed: {e}");
                inner.apply(Event::Fail(e.to_string()));
            }
        }
    }

    /// Done/Failed → Idle, discarding result, error and transcript.
    pub async fn reset(&self) -> Transition {
        let mut inner = self.inner.lock().await;
        let transition = inner.apply(Event::Reset);
        if transition.is_moved() {
            info!("Session reset");
        }
        transition
    }

    /// Asks a follow-up question about the current result. At most one
    /// question is outstanding; the analyst turn is recorded before the
    /// model is called and the assistant turn once it answers.
    pub async fn ask(&self, question: &str) -> AskOutcome {
        let (context, epoch) = {
            let mut inner = self.inner.lock().await;
            let Some(result) = inner.machine.state().result().cloned() else {
                return AskOutcome::Ignored {
                    reason: "no finished analysis to ask about",
                };
            };
            if question.trim().is_empty() {
                return AskOutcome::Ignored {
                    reason: "question is empty",
                };
            }
            if inner.chat_pending {
                return AskOutcome::Ignored {
                    reason: "waiting for the previous answer",
                };
            }
            inner.transcript.push(Role::Analyst, question);
            inner.chat_pending = true;
            (result, inner.epoch)
        };

        let text = match self.chat.ask(question, &context).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Replacing failed follow-up answer with apology: {e}");
                CHAT_FAILURE_MESSAGE.to_string()
            }
        };

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            warn!("Dropping follow-up answer for a discarded analysis");
            return AskOutcome::Discarded;
        }
        inner.transcript.push(Role::Assistant, text.clone());
        inner.chat_pending = false;
        AskOutcome::Answered { text }
    }

    pub async fn result(&self) -> Option<Arc<AnalysisResult>> {
        self.inner.lock().await.machine.state().result().cloned()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        let state = inner.machine.state();
        let started_at = match state {
            ApplicationState::Running { started_at, .. } => Some(*started_at),
            _ => None,
        };
        SessionSnapshot {
            status: state.status(),
            run_id: state.run_id(),
            started_at,
            result: state.result().map(|r| r.as_ref().clone()),
            error: state.error().map(str::to_string),
            transcript: inner.transcript.turns().to_vec(),
            chat_pending: inner.chat_pending,
        }
    }
}
