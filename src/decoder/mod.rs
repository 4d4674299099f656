//! Stream decoder: model chunks in, typed events out.
//!
//! Single pass, one chunk at a time. The decoder never parses tool-call
//! argument JSON; it only says which call each fragment belongs to.

use std::collections::{HashMap, HashSet};

use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::PilotError;
use crate::provider::{ChunkStream, ModelChunk, ToolCallFragment};
use crate::types::FinishReason;

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    TextDelta {
        text: String,
    },
    /// First fragment of a call, with whatever argument text it carried.
    ToolCallStart {
        id: String,
        name: String,
        args_text: String,
    },
    ToolCallArgs {
        id: String,
        fragment: String,
    },
    Finish {
        reason: FinishReason,
    },
    Error {
        message: String,
    },
}

/// Demultiplexes chunks into [`DecodedEvent`]s. Stops after `Finish` or `Error`.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    ids_by_index: HashMap<u32, String>,
    seen_ids: HashSet<String>,
    last_id: Option<String>,
    done: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a terminal event has been produced.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Decode one chunk. Within a chunk: text, then tool calls, then finish.
    pub fn decode(&mut self, chunk: ModelChunk) -> Vec<DecodedEvent> {
        if self.done {
            return Vec::new();
        }
        let mut events = Vec::new();

        if let Some(text) = chunk.content.filter(|t| !t.is_empty()) {
            events.push(DecodedEvent::TextDelta { text });
        }
        for fragment in chunk.tool_calls {
            if let Some(event) = self.decode_fragment(fragment) {
                events.push(event);
            }
        }
        if let Some(reason) = chunk.finish_reason {
            self.done = true;
            events.push(DecodedEvent::Finish {
                reason: FinishReason::from_provider(&reason),
            });
        }
        events
    }

    /// Record a transport failure.
    pub fn fail(&mut self, error: &PilotError) -> Option<DecodedEvent> {
        if self.done {
            return None;
        }
        self.done = true;
        Some(DecodedEvent::Error {
            message: error.to_string(),
        })
    }

    /// The provider closed the stream. Yields `Finish(stop)` if nothing
    /// terminal was seen.
    pub fn end(&mut self) -> Option<DecodedEvent> {
        if self.done {
            return None;
        }
        self.done = true;
        Some(DecodedEvent::Finish {
            reason: FinishReason::Stop,
        })
    }

    fn decode_fragment(&mut self, fragment: ToolCallFragment) -> Option<DecodedEvent> {
        let known_id = match (&fragment.id, fragment.index) {
            (Some(id), _) if self.seen_ids.contains(id) => Some(id.clone()),
            (None, Some(index)) => self.ids_by_index.get(&index).cloned(),
            (None, None) if fragment.name.is_none() => self.last_id.clone(),
            _ => None,
        };

        if let Some(id) = known_id {
            let text = fragment.arguments.unwrap_or_default();
            if text.is_empty() {
                return None;
            }
            return Some(DecodedEvent::ToolCallArgs { id, fragment: text });
        }

        if fragment.id.is_none() && fragment.name.is_none() {
            tracing::warn!(index = ?fragment.index, "dropping tool-call fragment with no owner");
            return None;
        }

        let id = fragment
            .id
            .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
        let name = fragment.name.unwrap_or_default();
        if let Some(index) = fragment.index {
            self.ids_by_index.insert(index, id.clone());
        }
        self.seen_ids.insert(id.clone());
        self.last_id = Some(id.clone());
        tracing::debug!(tool_call_id = %id, tool = %name, "tool call announced");

        Some(DecodedEvent::ToolCallStart {
            id,
            name,
            args_text: fragment.arguments.unwrap_or_default(),
        })
    }
}

/// Decode a whole chunk stream. The output always ends with exactly one
/// `Finish` or `Error`.
pub fn decode_stream(chunks: ChunkStream) -> BoxStream<'static, DecodedEvent> {
    let stream = async_stream::stream! {
        let mut decoder = StreamDecoder::new();
        futures::pin_mut!(chunks);

        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => {
                    for event in decoder.decode(chunk) {
                        yield event;
                    }
                }
                Err(e) => {
                    if let Some(event) = decoder.fail(&e) {
                        yield event;
                    }
                }
            }
            if decoder.is_done() {
                break;
            }
        }
        if let Some(event) = decoder.end() {
            yield event;
        }
    };
    Box::pin(stream)
}
