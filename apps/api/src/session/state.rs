//! The Application State Machine as a pure transition table.
//!
//! `Idle → Running → {Done, Failed}`, `Done → Idle`, `Failed → Idle`.
//! Every (state, event) pair is defined; pairs outside the table are
//! `Transition::Ignored` and leave the state untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::models::AnalysisResult;

#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationState {
    Idle,
    Running {
        run_id: Uuid,
        started_at: DateTime<Utc>,
    },
    Done(Arc<AnalysisResult>),
    Failed(String),
}

impl ApplicationState {
    pub fn status(&self) -> Status {
        match self {
            ApplicationState::Idle => Status::Idle,
            ApplicationState::Running { .. } => Status::Running,
            ApplicationState::Done(_) => Status::Done,
            ApplicationState::Failed(_) => Status::Failed,
        }
    }

    pub fn result(&self) -> Option<&Arc<AnalysisResult>> {
        match self {
            ApplicationState::Done(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ApplicationState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            ApplicationState::Running { run_id, .. } => Some(*run_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub enum Event {
    /// A file selection; `file_count` of zero is never a transition.
    Select { file_count: usize },
    Succeed(Arc<AnalysisResult>),
    Fail(String),
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The state changed; carries the state that was left.
    Moved { from: Status, to: Status },
    Ignored { state: Status, reason: &'static str },
}

impl Transition {
    pub fn is_moved(&self) -> bool {
        matches!(self, Transition::Moved { .. })
    }
}

#[derive(Debug)]
pub struct StateMachine {
    state: ApplicationState,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            state: ApplicationState::Idle,
        }
    }
}

impl StateMachine {
    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    pub fn apply(&mut self, event: Event) -> Transition {
        let from = self.state.status();
        let next = match (&self.state, event) {
            (ApplicationState::Idle, Event::Select { file_count: 0 }) => {
                return ignored(from, "no files selected")
            }
            (ApplicationState::Idle, Event::Select { .. }) => ApplicationState::Running {
                run_id: Uuid::new_v4(),
                started_at: Utc::now(),
            },
            (ApplicationState::Running { .. }, Event::Succeed(result)) => {
                ApplicationState::Done(result)
            }
            (ApplicationState::Running { .. }, Event::Fail(message)) => {
                ApplicationState::Failed(message)
            }
            (ApplicationState::Done(_) | ApplicationState::Failed(_), Event::Reset) => {
                ApplicationState::Idle
            }
            (ApplicationState::Running { .. }, Event::Select { .. }) => {
                return ignored(from, "an analysis is already running")
            }
            (ApplicationState::Done(_) | ApplicationState::Failed(_), Event::Select { .. }) => {
                return ignored(from, "reset before starting a new analysis")
            }
            (ApplicationState::Idle | ApplicationState::Running { .. }, Event::Reset) => {
                return ignored(from, "nothing to reset")
            }
            (_, Event::Succeed(_) | Event::Fail(_)) => {
                return ignored(from, "no analysis is running")
            }
        };

        self.state = next;
        Transition::Moved {
            from,
            to: self.state.status(),
        }
    }
}

fn ignored(state: Status, reason: &'static str) -> Transition {
    Transition::Ignored { state, reason }
}

// ────────────────────────────────────────────────────────────────────────────
// Chat transcript
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Analyst,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ChatTranscript {
    turns: Vec<ChatTurn>,
}

impl ChatTranscript {
    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(ChatTurn {
            role,
            text: text.into(),
            at: Utc::now(),
        });
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
