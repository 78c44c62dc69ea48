//! Deterministic conversation simulator.
//!
//! The simulator owns one conversation: it matches each incoming stimulus to
//! an event block, drives the flow machine over the graph, renders the
//! resulting replies, and keeps the transcript. Everything is pure state plus
//! a simulated clock, so replaying the same stimulus sequence against the
//! same graph always yields the same transcript.

use crate::block::{BlockKind, EventSpec, ReplySpec};
use crate::condition::Value;
use crate::flex::{self, FlexDocument};
use crate::flow::{
    ControlFlowProcessor, ExecutionContext, FlowRunner, MachineState, ReplyEvent, RunOutcome,
    Stimulus, TraceEntry,
};
use crate::graph::BlockGraph;
use crate::matcher::{EventMatcher, PatternSpec};
use crate::validate::ValidationIssue;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Flex,
    Sticker,
    Image,
}

/// One entry of the simulated transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMessage {
    pub role: Role,
    pub message_type: MessageType,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex: Option<FlexDocument>,
}

impl TurnMessage {
    fn user_text(content: impl Into<String>) -> TurnMessage {
        TurnMessage {
            role: Role::User,
            message_type: MessageType::Text,
            content: content.into(),
            flex: None,
        }
    }

    fn bot_text(content: impl Into<String>) -> TurnMessage {
        TurnMessage {
            role: Role::Bot,
            message_type: MessageType::Text,
            content: content.into(),
            flex: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Sent when no event block matches the stimulus.
    pub fallback_reply: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            fallback_reply: "抱歉，我不明白您的意思".to_string(),
        }
    }
}

/// A turn frozen at a `user_input` wait, waiting for the next stimulus.
struct PendingTurn {
    state: MachineState,
    variables: AHashMap<String, Value>,
    clock_ms: u64,
}

/// Runs conversations against a compiled block graph.
pub struct Simulator {
    graph: BlockGraph,
    matcher: EventMatcher,
    /// Event specs by block id, in graph declaration order alongside `graph`.
    event_specs: AHashMap<String, EventSpec>,
    processor: ControlFlowProcessor,
    flex_store: AHashMap<String, FlexDocument>,
    designer_doc: Option<serde_json::Value>,
    carried_variables: AHashMap<String, Value>,
    pending: Option<PendingTurn>,
    transcript: Vec<TurnMessage>,
    last_trace: Vec<TraceEntry>,
    registration_issues: Vec<ValidationIssue>,
    config: SimulatorConfig,
}

impl Simulator {
    pub fn new(graph: BlockGraph) -> Self {
        Self::with_config(graph, SimulatorConfig::default())
    }

    pub fn with_config(graph: BlockGraph, config: SimulatorConfig) -> Self {
        let mut matcher = EventMatcher::new();
        let mut event_specs = AHashMap::new();
        let mut registration_issues = Vec::new();

        for block in graph.blocks_in_order() {
            let BlockKind::Event(spec) = &block.kind else {
                continue;
            };
            event_specs.insert(block.id.clone(), spec.clone());
            if let Some(pattern) = &spec.condition {
                // Pattern id doubles as the owning block id; one pattern per
                // event block.
                let issue = matcher.add_pattern(PatternSpec {
                    id: block.id.clone(),
                    block_id: block.id.clone(),
                    strategy: spec.strategy,
                    pattern: pattern.clone(),
                    case_sensitive: spec.case_sensitive,
                    weight: spec.weight,
                    enabled: true,
                });
                registration_issues.extend(issue);
            }
        }

        Self {
            graph,
            matcher,
            event_specs,
            processor: ControlFlowProcessor::new(),
            flex_store: AHashMap::new(),
            designer_doc: None,
            carried_variables: AHashMap::new(),
            pending: None,
            transcript: Vec::new(),
            last_trace: Vec::new(),
            registration_issues,
            config,
        }
    }

    /// Issues raised while registering trigger patterns, e.g. bad regexes.
    pub fn registration_issues(&self) -> &[ValidationIssue] {
        &self.registration_issues
    }

    /// Stores a named Flex document for `flex` replies to reference.
    pub fn save_flex(&mut self, name: &str, document: FlexDocument) {
        self.flex_store.insert(name.to_string(), document);
    }

    /// Sets the designer document flex replies fall back to when they name
    /// no saved document.
    pub fn set_designer_document(&mut self, document: serde_json::Value) {
        self.designer_doc = Some(document);
    }

    pub fn transcript(&self) -> &[TurnMessage] {
        &self.transcript
    }

    /// Trace of the most recent turn, for the developer console.
    pub fn last_trace(&self) -> &[TraceEntry] {
        &self.last_trace
    }

    pub fn variables(&self) -> &AHashMap<String, Value> {
        &self.carried_variables
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.carried_variables.insert(name.to_string(), value);
    }

    /// Clears everything conversation-scoped: variables, pending waits, loop
    /// state, transcript. Saved Flex documents survive.
    pub fn reset(&mut self) {
        self.carried_variables.clear();
        self.pending = None;
        self.processor.reset();
        self.transcript.clear();
        self.last_trace.clear();
    }

    /// Starts a fresh conversation with the same bot: conversation state is
    /// dropped but the transcript of previous users is kept.
    pub fn new_user(&mut self) {
        self.carried_variables.clear();
        self.pending = None;
        self.processor.reset();
        self.last_trace.clear();
    }

    /// Runs one turn and returns the bot messages it produced. The user
    /// stimulus and the bot messages are also appended to the transcript.
    pub fn send(&mut self, stimulus: Stimulus) -> Vec<TurnMessage> {
        self.transcript
            .push(TurnMessage::user_text(describe_stimulus(&stimulus)));

        let run = match self.pending.take() {
            Some(pending) => self.resume_turn(pending, stimulus),
            None => self.start_turn(stimulus),
        };

        let messages = match run {
            Some((replies, outcome, ctx)) => {
                let mut messages = self.render_replies(&replies);
                match outcome {
                    RunOutcome::Suspended(state) => {
                        self.pending = Some(PendingTurn {
                            state,
                            variables: ctx.variables.clone(),
                            clock_ms: ctx.clock_ms,
                        });
                    }
                    RunOutcome::Failed { .. } if messages.is_empty() => {
                        messages.push(TurnMessage::bot_text(self.config.fallback_reply.clone()));
                    }
                    RunOutcome::Completed | RunOutcome::Failed { .. } => {}
                }
                self.carried_variables = ctx.variables;
                self.last_trace = ctx.trace;
                messages
            }
            None => {
                // Nothing matched the stimulus.
                self.last_trace.clear();
                vec![TurnMessage::bot_text(self.config.fallback_reply.clone())]
            }
        };

        self.transcript.extend(messages.iter().cloned());
        messages
    }

    fn start_turn(
        &mut self,
        stimulus: Stimulus,
    ) -> Option<(Vec<ReplyEvent>, RunOutcome, ExecutionContext)> {
        let mut ctx = ExecutionContext::seeded(stimulus, self.carried_variables.clone());
        let event_block = self.select_event(&mut ctx)?;
        let state = MachineState::starting_at(&event_block);
        let run = FlowRunner::new(&self.graph).run(&mut self.processor, &mut ctx, state);
        Some((run.replies, run.outcome, ctx))
    }

    fn resume_turn(
        &mut self,
        pending: PendingTurn,
        stimulus: Stimulus,
    ) -> Option<(Vec<ReplyEvent>, RunOutcome, ExecutionContext)> {
        let mut ctx = ExecutionContext::seeded(stimulus, pending.variables);
        ctx.clock_ms = pending.clock_ms;
        let run = FlowRunner::new(&self.graph).run(&mut self.processor, &mut ctx, pending.state);
        Some((run.replies, run.outcome, ctx))
    }

    /// Event-block selection: conditioned blocks matching the stimulus text
    /// first, best-ranked; then the first declared unconditioned block of a
    /// matching event type.
    fn select_event(&self, ctx: &mut ExecutionContext) -> Option<String> {
        let result = self
            .matcher
            .find_match(ctx.stimulus.message_text(), &ctx.variables);
        if result.matched {
            for block_id in &result.matched_pattern_ids {
                let Some(spec) = self.event_specs.get(block_id) else {
                    continue;
                };
                if ctx.stimulus.matches_event_type(&spec.event_type) {
                    for (name, value) in &result.extracted_values {
                        ctx.variables
                            .insert(name.clone(), Value::Str(value.clone()));
                    }
                    return Some(block_id.clone());
                }
            }
        }

        // Catch-alls fire only when no conditioned block matched.
        self.graph
            .blocks_in_order()
            .filter(|block| block.kind.is_event())
            .find(|block| {
                self.event_specs
                    .get(&block.id)
                    .is_some_and(|spec| {
                        spec.condition.is_none()
                            && ctx.stimulus.matches_event_type(&spec.event_type)
                    })
            })
            .map(|block| block.id.clone())
    }

    fn render_replies(&self, replies: &[ReplyEvent]) -> Vec<TurnMessage> {
        replies.iter().map(|reply| self.render_reply(reply)).collect()
    }

    fn render_reply(&self, reply: &ReplyEvent) -> TurnMessage {
        match &reply.spec {
            ReplySpec::Text { text } => {
                let content = reply
                    .rendered_text
                    .clone()
                    .unwrap_or_else(|| text.clone());
                TurnMessage::bot_text(content)
            }
            ReplySpec::Flex {
                name,
                inline,
                alt_text,
            } => {
                let document = self.resolve_flex(name.as_deref(), inline.as_ref(), alt_text);
                TurnMessage {
                    role: Role::Bot,
                    message_type: MessageType::Flex,
                    content: alt_text.clone(),
                    flex: Some(document.ensure_body()),
                }
            }
            ReplySpec::Sticker {
                package_id,
                sticker_id,
            } => TurnMessage {
                role: Role::Bot,
                message_type: MessageType::Sticker,
                content: format!("{}/{}", package_id, sticker_id),
                flex: None,
            },
            ReplySpec::Image { url, .. } => TurnMessage {
                role: Role::Bot,
                message_type: MessageType::Image,
                content: url.clone(),
                flex: None,
            },
        }
    }

    /// Resolution order: saved named document, then the current designer
    /// document, then the block's inline data, then a placeholder.
    fn resolve_flex(
        &self,
        name: Option<&str>,
        inline: Option<&serde_json::Value>,
        alt_text: &str,
    ) -> FlexDocument {
        if let Some(name) = name {
            if let Some(saved) = self.flex_store.get(name) {
                return saved.clone();
            }
            tracing::debug!(name, "no saved flex document under this name");
        }
        if let Some(doc) = &self.designer_doc {
            return flex::normalize(doc);
        }
        if let Some(inline) = inline {
            return flex::normalize(inline);
        }
        FlexDocument::placeholder(alt_text)
    }
}

/// User-side transcript text for a stimulus.
fn describe_stimulus(stimulus: &Stimulus) -> String {
    match stimulus {
        Stimulus::Text { text } => text.clone(),
        Stimulus::Postback { data } => format!("[postback: {}]", data),
        Stimulus::Follow => "[follow]".to_string(),
        Stimulus::Unfollow => "[unfollow]".to_string(),
        Stimulus::Sticker {
            package_id,
            sticker_id,
        } => format!("[sticker {}/{}]", package_id, sticker_id),
    }
}
