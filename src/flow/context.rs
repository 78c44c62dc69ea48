use crate::condition::Value;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A simulated stimulus pushed into the simulator by the surrounding UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stimulus {
    Text { text: String },
    Postback { data: String },
    Follow,
    Unfollow,
    Sticker { package_id: String, sticker_id: String },
}

impl Stimulus {
    pub fn text(text: impl Into<String>) -> Stimulus {
        Stimulus::Text { text: text.into() }
    }

    /// The textual payload patterns are matched against.
    pub fn message_text(&self) -> &str {
        match self {
            Stimulus::Text { text } => text,
            Stimulus::Postback { data } => data,
            _ => "",
        }
    }

    /// Canonical event-type string, matched against `EventSpec::event_type`.
    pub fn event_type(&self) -> &'static str {
        match self {
            Stimulus::Text { .. } => "message.text",
            Stimulus::Postback { .. } => "postback",
            Stimulus::Follow => "follow",
            Stimulus::Unfollow => "unfollow",
            Stimulus::Sticker { .. } => "message.sticker",
        }
    }

    /// Event blocks may declare either the canonical dotted type or its
    /// final segment (`text` for `message.text`).
    pub fn matches_event_type(&self, declared: &str) -> bool {
        let canonical = self.event_type();
        declared == canonical || Some(declared) == canonical.split('.').next_back()
    }
}

/// Ordered record of what a simulated turn did, for the developer console.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEntry {
    Visited { block_id: String },
    LoopCapExhausted { block_id: String, iterations: u32 },
    WaitTimedOut { block_id: String, waited_ms: u64 },
    Suspended { block_id: String },
    ExecutionFailed { block_id: String, message: String },
}

/// Mutable, simulation-scoped state for one simulated turn.
///
/// Created fresh per turn, optionally seeded with variables carried over
/// from the previous turn. The `clock_ms` field is a simulated clock: waits
/// advance it instead of sleeping, which keeps every run deterministic.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub variables: AHashMap<String, Value>,
    pub loop_counters: AHashMap<String, u32>,
    pub stimulus: Stimulus,
    pub clock_ms: u64,
    pub trace: Vec<TraceEntry>,
}

impl ExecutionContext {
    pub fn new(stimulus: Stimulus) -> Self {
        Self::seeded(stimulus, AHashMap::new())
    }

    /// Creates a context carrying variables from a previous turn. The
    /// stimulus text is always (re)published as the `message` variable.
    pub fn seeded(stimulus: Stimulus, mut variables: AHashMap<String, Value>) -> Self {
        variables.insert(
            "message".to_string(),
            Value::Str(stimulus.message_text().to_string()),
        );
        Self {
            variables,
            loop_counters: AHashMap::new(),
            stimulus,
            clock_ms: 0,
            trace: Vec::new(),
        }
    }

    pub fn visit(&mut self, block_id: &str) {
        self.trace.push(TraceEntry::Visited {
            block_id: block_id.to_string(),
        });
    }

    /// Ids of visited blocks, in order.
    pub fn visited(&self) -> Vec<&str> {
        self.trace
            .iter()
            .filter_map(|entry| match entry {
                TraceEntry::Visited { block_id } => Some(block_id.as_str()),
                _ => None,
            })
            .collect()
    }
}
