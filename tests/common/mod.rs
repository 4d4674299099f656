//! Shared test helpers: a scripted model provider and a recording desktop.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use desktop_pilot::desktop::{ActionOutput, CommandOutput, DesktopAction, DesktopSession};
use desktop_pilot::error::PilotError;
use desktop_pilot::protocol::Frame;
use desktop_pilot::provider::{ChunkStream, ModelChunk, ModelProvider, ModelRequest};
use desktop_pilot::types::{ExchangeRequest, IncomingMessage};

/// One step of a scripted model turn.
#[derive(Debug, Clone)]
pub enum Step {
    Chunk(ModelChunk),
    /// Transport failure mid-stream.
    Fail(String),
    /// Never yields again.
    Hang,
}

/// How a scripted turn opens.
#[derive(Debug, Clone)]
pub enum Turn {
    Stream(Vec<Step>),
    OpenError(u16, String),
}

/// A provider that replays queued turns and records every request.
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<Turn>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            turns: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_turn(self, steps: Vec<Step>) -> Self {
        self.turns.lock().unwrap().push_back(Turn::Stream(steps));
        self
    }

    pub fn with_open_error(self, status: u16, message: &str) -> Self {
        self.turns
            .lock()
            .unwrap()
            .push_back(Turn::OpenError(status, message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn stream_chat(&self, request: &ModelRequest) -> Result<ChunkStream, PilotError> {
        self.requests.lock().unwrap().push(request.clone());
        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PilotError::Stream("script exhausted".into()))?;

        let steps = match turn {
            Turn::OpenError(status, message) => return Err(PilotError::api(status, message)),
            Turn::Stream(steps) => steps,
        };

        let stream = async_stream::stream! {
            for step in steps {
                match step {
                    Step::Chunk(chunk) => yield Ok(chunk),
                    Step::Fail(message) => yield Err(PilotError::Stream(message)),
                    Step::Hang => futures::future::pending::<()>().await,
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

/// A desktop that records actions and counts kills.
pub struct RecordingDesktop {
    sandbox_id: String,
    actions: Mutex<Vec<DesktopAction>>,
    kills: AtomicUsize,
    failing_commands: bool,
    failing_kill: bool,
    hanging_actions: bool,
    stdout: String,
    screenshot: Vec<u8>,
}

impl RecordingDesktop {
    pub fn new() -> Self {
        Self {
            sandbox_id: "sbx-test".to_string(),
            actions: Mutex::new(Vec::new()),
            kills: AtomicUsize::new(0),
            failing_commands: false,
            failing_kill: false,
            hanging_actions: false,
            stdout: String::new(),
            screenshot: b"\x89PNG".to_vec(),
        }
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    /// Every shell command fails.
    pub fn with_failing_commands(mut self) -> Self {
        self.failing_commands = true;
        self
    }

    /// `kill()` is counted, then fails.
    pub fn with_failing_kill(mut self) -> Self {
        self.failing_kill = true;
        self
    }

    /// Every action is recorded and then never completes.
    pub fn with_hanging_actions(mut self) -> Self {
        self.hanging_actions = true;
        self
    }

    pub fn actions(&self) -> Vec<DesktopAction> {
        self.actions.lock().unwrap().clone()
    }

    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DesktopSession for RecordingDesktop {
    fn sandbox_id(&self) -> &str {
        &self.sandbox_id
    }

    async fn perform(&self, action: DesktopAction) -> Result<ActionOutput, PilotError> {
        self.actions.lock().unwrap().push(action.clone());
        if self.hanging_actions {
            futures::future::pending::<()>().await;
        }
        match action {
            DesktopAction::Screenshot => Ok(ActionOutput::Image(self.screenshot.clone())),
            DesktopAction::RunCommand(_) if self.failing_commands => {
                Err(PilotError::Desktop("command exited with status 127".into()))
            }
            DesktopAction::RunCommand(_) => Ok(ActionOutput::Command(CommandOutput {
                stdout: self.stdout.clone(),
                stderr: String::new(),
                exit_code: Some(0),
            })),
            _ => Ok(ActionOutput::Done),
        }
    }

    async fn kill(&self) -> Result<(), PilotError> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        if self.failing_kill {
            return Err(PilotError::Desktop("sandbox not found".into()));
        }
        Ok(())
    }
}

pub fn request(text: &str) -> ExchangeRequest {
    ExchangeRequest {
        messages: vec![IncomingMessage::new("user", text)],
        sandbox_id: "sbx-test".to_string(),
    }
}

pub fn parse_frames(frames: &[String]) -> Vec<Frame> {
    frames
        .iter()
        .map(|f| Frame::parse(f).expect("well-formed frame"))
        .collect()
}

pub fn kinds(frames: &[Frame]) -> Vec<&'static str> {
    frames.iter().map(Frame::kind).collect()
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
