//! Control-flow execution.
//!
//! The executor is an explicit task-queue machine rather than a recursive
//! walker: nested control flow, try-scope error routing, and `user_input`
//! suspension are all plain data, so a turn can be frozen mid-wait and
//! resumed (or discarded) later.

pub mod context;

pub use context::{ExecutionContext, Stimulus, TraceEntry};

use crate::block::{BlockKind, ControlSpec, ReplySpec, SettingSpec, WaitSpec};
use crate::condition::{Condition, Value};
use crate::error::ExecError;
use crate::graph::{BlockGraph, EdgeKind};
use ahash::AHashMap;
use std::collections::VecDeque;

/// Hard cap on loop iterations, applied regardless of user-declared bounds.
pub const MAX_LOOP_ITERATIONS: u32 = 1000;
/// Hard cap on simulated wait time per wait block, in milliseconds.
pub const MAX_WAIT_MS: u64 = 10_000;
/// Polling interval for condition-mode waits, in simulated milliseconds.
pub const WAIT_POLL_INTERVAL_MS: u64 = 100;

/// Per-loop bookkeeping, owned by the processor's active-loop table and
/// keyed by block id. Removed on completion, cap exhaustion, or reset, so a
/// loop block revisited after completion starts fresh.
#[derive(Debug, Clone)]
pub struct LoopState {
    pub block_id: String,
    pub current_iteration: u32,
    pub max_iterations: u32,
}

/// What the processor wants the machine to do after one control block.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Follow this edge kind's targets.
    Follow(EdgeKind),
    /// Run the loop body, then re-enter this block.
    Iterate,
    /// Open a try scope around the `then` chain.
    EnterTry,
    /// Freeze the turn until the next user message.
    Suspend,
}

/// Executes control blocks against an execution context.
///
/// Stateless between unrelated blocks; the only retained state is the
/// active-loop table and a parse cache for condition strings. Both are
/// instance fields, never globals, so concurrent simulations stay isolated.
#[derive(Default)]
pub struct ControlFlowProcessor {
    active_loops: AHashMap<String, LoopState>,
    condition_cache: AHashMap<String, Condition>,
}

impl ControlFlowProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all loop state, e.g. when the simulator is reset.
    pub fn reset(&mut self) {
        self.active_loops.clear();
    }

    pub fn active_loop(&self, block_id: &str) -> Option<&LoopState> {
        self.active_loops.get(block_id)
    }

    fn eval_condition(
        &mut self,
        source: &str,
        variables: &AHashMap<String, Value>,
    ) -> Result<bool, ExecError> {
        if !self.condition_cache.contains_key(source) {
            let parsed = Condition::parse(source)?;
            self.condition_cache.insert(source.to_string(), parsed);
        }
        let condition = &self.condition_cache[source];
        Ok(condition.eval_truthy(variables)?)
    }

    /// Executes one control block and reports where flow goes next.
    pub fn step(
        &mut self,
        block_id: &str,
        spec: &ControlSpec,
        ctx: &mut ExecutionContext,
    ) -> Result<StepOutcome, ExecError> {
        match spec {
            ControlSpec::If { condition } => {
                let taken = self.eval_condition(condition, &ctx.variables)?;
                Ok(StepOutcome::Follow(if taken {
                    EdgeKind::Then
                } else {
                    EdgeKind::Else
                }))
            }
            ControlSpec::While {
                condition,
                max_iterations,
            } => self.step_while(block_id, condition, *max_iterations, ctx),
            ControlSpec::For {
                variable,
                start,
                end,
                step,
            } => self.step_for(block_id, variable, *start, *end, *step, ctx),
            ControlSpec::Wait(wait) => self.step_wait(block_id, wait, ctx),
            ControlSpec::Try => Ok(StepOutcome::EnterTry),
            ControlSpec::Switch { variable, cases } => {
                let value = ctx.variables.get(variable).cloned();
                let Some(value) = value else {
                    // Undefined switch variable falls through to the default
                    // branch rather than failing the turn.
                    tracing::debug!(block_id, %variable, "switch variable undefined");
                    return Ok(StepOutcome::Follow(EdgeKind::Else));
                };
                let text = value.to_string();
                let index = cases.iter().position(|case| case == &text);
                Ok(StepOutcome::Follow(match index {
                    Some(i) => EdgeKind::Case(i),
                    None => EdgeKind::Else,
                }))
            }
        }
    }

    fn step_while(
        &mut self,
        block_id: &str,
        condition: &str,
        declared_max: u32,
        ctx: &mut ExecutionContext,
    ) -> Result<StepOutcome, ExecError> {
        let max = declared_max.min(MAX_LOOP_ITERATIONS);
        let (iterations, cap) = {
            let state = self
                .active_loops
                .entry(block_id.to_string())
                .or_insert_with(|| LoopState {
                    block_id: block_id.to_string(),
                    current_iteration: 0,
                    max_iterations: max,
                });
            (state.current_iteration, state.max_iterations)
        };

        if iterations >= cap {
            self.finish_loop(block_id, ctx);
            ctx.trace.push(TraceEntry::LoopCapExhausted {
                block_id: block_id.to_string(),
                iterations,
            });
            tracing::warn!(block_id, iterations, "while loop hit its iteration cap");
            return Ok(StepOutcome::Follow(EdgeKind::Next));
        }

        if self.eval_condition(condition, &ctx.variables)? {
            if let Some(state) = self.active_loops.get_mut(block_id) {
                state.current_iteration += 1;
                ctx.loop_counters
                    .insert(block_id.to_string(), state.current_iteration);
            }
            Ok(StepOutcome::Iterate)
        } else {
            self.finish_loop(block_id, ctx);
            Ok(StepOutcome::Follow(EdgeKind::Next))
        }
    }

    fn step_for(
        &mut self,
        block_id: &str,
        variable: &str,
        start: f64,
        end: f64,
        step: f64,
        ctx: &mut ExecutionContext,
    ) -> Result<StepOutcome, ExecError> {
        if step == 0.0 {
            return Err(ExecError::ZeroStep {
                block_id: block_id.to_string(),
            });
        }
        let current = match self.active_loops.get(block_id) {
            None => {
                self.active_loops.insert(
                    block_id.to_string(),
                    LoopState {
                        block_id: block_id.to_string(),
                        current_iteration: 0,
                        max_iterations: MAX_LOOP_ITERATIONS,
                    },
                );
                start
            }
            Some(_) => {
                let previous = ctx
                    .variables
                    .get(variable)
                    .and_then(Value::as_number)
                    .unwrap_or(start);
                previous + step
            }
        };

        // Direction-aware continuation: step > 0 counts up to `end`,
        // step < 0 counts down.
        let continues = if step > 0.0 { current < end } else { current > end };
        let (iterations, cap) = match self.active_loops.get(block_id) {
            Some(state) => (state.current_iteration, state.max_iterations),
            None => (0, MAX_LOOP_ITERATIONS),
        };

        if continues && iterations < cap {
            if let Some(state) = self.active_loops.get_mut(block_id) {
                state.current_iteration += 1;
            }
            ctx.variables
                .insert(variable.to_string(), Value::Number(current));
            ctx.loop_counters.insert(block_id.to_string(), iterations + 1);
            Ok(StepOutcome::Iterate)
        } else {
            let capped = continues;
            // The loop variable does not outlive the loop.
            ctx.variables.remove(variable);
            self.finish_loop(block_id, ctx);
            if capped {
                ctx.trace.push(TraceEntry::LoopCapExhausted {
                    block_id: block_id.to_string(),
                    iterations,
                });
                tracing::warn!(block_id, iterations, "for loop hit its iteration cap");
            }
            Ok(StepOutcome::Follow(EdgeKind::Next))
        }
    }

    fn step_wait(
        &mut self,
        block_id: &str,
        wait: &WaitSpec,
        ctx: &mut ExecutionContext,
    ) -> Result<StepOutcome, ExecError> {
        match wait {
            WaitSpec::Time { ms } => {
                ctx.clock_ms += (*ms).min(MAX_WAIT_MS);
                Ok(StepOutcome::Follow(EdgeKind::Next))
            }
            WaitSpec::Condition {
                condition,
                timeout_ms,
            } => {
                let timeout = (*timeout_ms).min(MAX_WAIT_MS);
                let mut waited = 0u64;
                loop {
                    if self.eval_condition(condition, &ctx.variables)? {
                        break;
                    }
                    if waited >= timeout {
                        ctx.trace.push(TraceEntry::WaitTimedOut {
                            block_id: block_id.to_string(),
                            waited_ms: waited,
                        });
                        tracing::warn!(block_id, waited, "condition wait timed out");
                        break;
                    }
                    waited += WAIT_POLL_INTERVAL_MS;
                    ctx.clock_ms += WAIT_POLL_INTERVAL_MS;
                }
                // Timeout is non-fatal: flow continues either way.
                Ok(StepOutcome::Follow(EdgeKind::Next))
            }
            WaitSpec::UserInput => Ok(StepOutcome::Suspend),
        }
    }

    fn finish_loop(&mut self, block_id: &str, ctx: &mut ExecutionContext) {
        self.active_loops.remove(block_id);
        ctx.loop_counters.remove(block_id);
    }
}

// ---------------------------------------------------------------------------
// The flow machine

/// One unit of scheduled work.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Enter(String),
    /// Marks the end of the innermost try region.
    PopScope,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryScope {
    pub block_id: String,
}

/// The frozen state of a turn: the remaining work queue and open try scopes.
/// Snapshotted when a `user_input` wait suspends, discarded on reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineState {
    pub queue: VecDeque<Task>,
    pub scopes: Vec<TryScope>,
}

impl MachineState {
    pub fn starting_at(block_id: &str) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(Task::Enter(block_id.to_string()));
        Self {
            queue,
            scopes: Vec::new(),
        }
    }
}

/// A reply emitted during execution. Text is interpolated at visit time so
/// loop variables land with their current values; other reply kinds are
/// rendered by the simulator afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyEvent {
    pub block_id: String,
    pub spec: ReplySpec,
    pub rendered_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    /// Waiting for the next user message; resume with the returned state.
    Suspended(MachineState),
    /// An unhandled execution error ended the turn.
    Failed { block_id: String, message: String },
}

/// Result of driving the machine until it runs out of work.
#[derive(Debug, Clone)]
pub struct TurnRun {
    pub outcome: RunOutcome,
    pub replies: Vec<ReplyEvent>,
}

/// Walks the graph executing one simulated turn.
pub struct FlowRunner<'g> {
    graph: &'g BlockGraph,
}

impl<'g> FlowRunner<'g> {
    pub fn new(graph: &'g BlockGraph) -> Self {
        Self { graph }
    }

    pub fn run(
        &self,
        processor: &mut ControlFlowProcessor,
        ctx: &mut ExecutionContext,
        mut state: MachineState,
    ) -> TurnRun {
        let mut replies = Vec::new();

        while let Some(task) = state.queue.pop_front() {
            match task {
                Task::PopScope => {
                    if let Some(scope) = state.scopes.pop() {
                        // Try region finished cleanly: finally, then whatever
                        // follows the try block.
                        self.push_chain(&mut state, &scope.block_id, EdgeKind::Next);
                        self.push_chain(&mut state, &scope.block_id, EdgeKind::Finally);
                    }
                }
                Task::Enter(block_id) => {
                    match self.enter(&block_id, processor, ctx, &mut state, &mut replies) {
                        Ok(Some(suspended)) => {
                            ctx.trace.push(TraceEntry::Suspended {
                                block_id: block_id.clone(),
                            });
                            return TurnRun {
                                outcome: RunOutcome::Suspended(suspended),
                                replies,
                            };
                        }
                        Ok(None) => {}
                        Err(error) => {
                            if let Some(failure) =
                                self.route_error(&mut state, ctx, &block_id, &error)
                            {
                                return TurnRun {
                                    outcome: failure,
                                    replies,
                                };
                            }
                        }
                    }
                }
            }
        }

        TurnRun {
            outcome: RunOutcome::Completed,
            replies,
        }
    }

    /// Executes one block. Returns the suspended state for `user_input`
    /// waits, `None` otherwise.
    fn enter(
        &self,
        block_id: &str,
        processor: &mut ControlFlowProcessor,
        ctx: &mut ExecutionContext,
        state: &mut MachineState,
        replies: &mut Vec<ReplyEvent>,
    ) -> Result<Option<MachineState>, ExecError> {
        let block = self
            .graph
            .block(block_id)
            .ok_or_else(|| ExecError::UnknownBlock(block_id.to_string()))?;
        ctx.visit(block_id);

        match &block.kind {
            BlockKind::Event(_) => {
                self.push_chain(state, block_id, EdgeKind::Next);
            }
            BlockKind::Reply(spec) | BlockKind::Push(spec) => {
                // A reply terminates its chain; queued continuations (loop
                // re-entries, scope markers) still run.
                let rendered_text = match spec {
                    ReplySpec::Text { text } => Some(interpolate(text, &ctx.variables)),
                    _ => None,
                };
                replies.push(ReplyEvent {
                    block_id: block_id.to_string(),
                    spec: spec.clone(),
                    rendered_text,
                });
            }
            BlockKind::Setting(SettingSpec::Set { variable, value }) => {
                ctx.variables.insert(variable.clone(), value.clone());
                self.push_chain(state, block_id, EdgeKind::Next);
            }
            BlockKind::Control(spec) => match processor.step(block_id, spec, ctx)? {
                StepOutcome::Follow(kind) => {
                    self.push_chain(state, block_id, kind);
                }
                StepOutcome::Iterate => {
                    state.queue.push_front(Task::Enter(block_id.to_string()));
                    self.push_chain(state, block_id, EdgeKind::LoopBody);
                }
                StepOutcome::EnterTry => {
                    state.scopes.push(TryScope {
                        block_id: block_id.to_string(),
                    });
                    state.queue.push_front(Task::PopScope);
                    self.push_chain(state, block_id, EdgeKind::Then);
                }
                StepOutcome::Suspend => {
                    // Resume straight into whatever follows the wait.
                    self.push_chain(state, block_id, EdgeKind::Next);
                    return Ok(Some(std::mem::take(state)));
                }
            },
            // Flex fragments and placeholders carry data, not behavior.
            BlockKind::FlexContainer(_)
            | BlockKind::FlexLayout(_)
            | BlockKind::FlexContent(_)
            | BlockKind::Placeholder => {
                self.push_chain(state, block_id, EdgeKind::Next);
            }
        }
        Ok(None)
    }

    /// Routes an execution error to the nearest try scope. Returns the
    /// terminal outcome when no scope is open.
    fn route_error(
        &self,
        state: &mut MachineState,
        ctx: &mut ExecutionContext,
        block_id: &str,
        error: &ExecError,
    ) -> Option<RunOutcome> {
        ctx.trace.push(TraceEntry::ExecutionFailed {
            block_id: block_id.to_string(),
            message: error.to_string(),
        });
        tracing::warn!(block_id, %error, "block execution failed");

        let Some(scope) = state.scopes.pop() else {
            state.queue.clear();
            return Some(RunOutcome::Failed {
                block_id: block_id.to_string(),
                message: error.to_string(),
            });
        };

        // Abandon the rest of the try region.
        while let Some(task) = state.queue.pop_front() {
            if task == Task::PopScope {
                break;
            }
        }
        self.push_chain(state, &scope.block_id, EdgeKind::Next);
        self.push_chain(state, &scope.block_id, EdgeKind::Finally);
        self.push_chain(state, &scope.block_id, EdgeKind::Catch);
        None
    }

    /// Schedules the targets of one edge kind ahead of everything queued,
    /// preserving their order.
    fn push_chain(&self, state: &mut MachineState, block_id: &str, kind: EdgeKind) {
        let targets = self.graph.connections.next_blocks(block_id, Some(&[kind]));
        for target in targets.into_iter().rev() {
            state.queue.push_front(Task::Enter(target));
        }
    }
}

/// Substitutes `{name}` placeholders in reply text with context variables.
/// Unknown names are left as-is so typos stay visible in the simulator.
pub fn interpolate(text: &str, variables: &AHashMap<String, Value>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match variables.get(name) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
