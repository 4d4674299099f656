//! Per-call argument accumulation.
//!
//! A call is announced by its first fragment and keeps accumulating argument
//! text until the provider signals it is complete: either another call starts
//! or the turn finishes. Only then is the text parsed, exactly once.

use crate::types::ToolCallRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallState {
    Accumulating,
    Ready(serde_json::Value),
    Invalid(String),
}

/// A tool call being assembled from streamed fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    raw_arguments: String,
    state: ToolCallState,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, initial_arguments: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            raw_arguments: initial_arguments.to_string(),
            state: ToolCallState::Accumulating,
        }
    }

    /// Append an argument fragment. Ignored once the call is finalized.
    pub fn append(&mut self, fragment: &str) {
        if matches!(self.state, ToolCallState::Accumulating) {
            self.raw_arguments.push_str(fragment);
        } else {
            tracing::warn!(tool_call_id = %self.id, "argument fragment after call was finalized");
        }
    }

    pub fn raw_arguments(&self) -> &str {
        &self.raw_arguments
    }

    pub fn state(&self) -> &ToolCallState {
        &self.state
    }

    /// Parse the accumulated text. Empty arguments mean an empty object.
    pub fn finalize(&mut self) -> &ToolCallState {
        if matches!(self.state, ToolCallState::Accumulating) {
            let trimmed = self.raw_arguments.trim();
            self.state = if trimmed.is_empty() {
                ToolCallState::Ready(serde_json::json!({}))
            } else {
                match serde_json::from_str::<serde_json::Value>(trimmed) {
                    Ok(value) => ToolCallState::Ready(value),
                    Err(e) => ToolCallState::Invalid(format!(
                        "arguments for tool '{}' are not valid JSON: {e}",
                        self.name
                    )),
                }
            };
        }
        &self.state
    }

    /// History entry for follow-up turns.
    pub fn to_record(&self) -> ToolCallRecord {
        let arguments = match &self.state {
            ToolCallState::Ready(value) => value.clone(),
            _ => serde_json::Value::String(self.raw_arguments.clone()),
        };
        ToolCallRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            arguments,
        }
    }
}

/// Best-effort view of arguments for the `tool-call` announcement frame.
/// Never used to decide whether a call is ready.
pub fn display_arguments(raw: &str) -> serde_json::Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Tracks the calls of one model turn in announcement order.
#[derive(Debug, Default)]
pub struct ToolCallTracker {
    open: Vec<ToolCall>,
    completed: Vec<ToolCallRecord>,
}

impl ToolCallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly announced call. Every call still open is complete
    /// from this point on and is returned, finalized, in announcement order.
    pub fn start(&mut self, call: ToolCall) -> Vec<ToolCall> {
        let completed = self.drain_open();
        self.open.push(call);
        completed
    }

    /// Route an argument fragment to its open call.
    pub fn append(&mut self, id: &str, fragment: &str) {
        match self.open.iter_mut().find(|c| c.id == id) {
            Some(call) => call.append(fragment),
            None => tracing::warn!(tool_call_id = id, "argument fragment for unknown tool call"),
        }
    }

    /// The turn ended: finalize and return every open call.
    pub fn finish(&mut self) -> Vec<ToolCall> {
        self.drain_open()
    }

    /// Calls dispatched during this turn, for the conversation history.
    pub fn completed(&self) -> &[ToolCallRecord] {
        &self.completed
    }

    pub fn has_open_calls(&self) -> bool {
        !self.open.is_empty()
    }

    fn drain_open(&mut self) -> Vec<ToolCall> {
        let mut drained: Vec<ToolCall> = self.open.drain(..).collect();
        for call in &mut drained {
            call.finalize();
            self.completed.push(call.to_record());
        }
        drained
    }
}
