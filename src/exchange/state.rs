//! Exchange lifecycle states and outcomes.

use serde::{Deserialize, Serialize};

use crate::types::FinishReason;

/// Where the orchestration loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeState {
    Streaming,
    Dispatching,
    Finished,
    Failed,
}

impl ExchangeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

/// How an exchange ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// The model stopped asking for tools, or the turn limit was reached.
    Finished {
        turns: u32,
        finish_reason: FinishReason,
    },
    /// The exchange failed and the desktop session was terminated.
    Failed { message: String },
}

impl ExchangeOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    pub fn state(&self) -> ExchangeState {
        match self {
            Self::Finished { .. } => ExchangeState::Finished,
            Self::Failed { .. } => ExchangeState::Failed,
        }
    }
}
