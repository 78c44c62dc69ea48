//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types from the taiwa crate. Import this
//! module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use taiwa::prelude::*;
//!
//! # fn run_example() -> Result<(), Box<dyn std::error::Error>> {
//! let designer_json = std::fs::read_to_string("path/to/bot.json")?;
//! let graph = BlockGraph::from_json(&designer_json)?;
//!
//! for issue in validate(&graph) {
//!     println!("[{:?}] {}", issue.severity, issue.message);
//! }
//!
//! let mut simulator = Simulator::new(graph);
//! for message in simulator.send(Stimulus::text("hello")) {
//!     println!("bot: {}", message.content);
//! }
//! # Ok(())
//! # }
//! ```

// Graph construction and connection management
pub use crate::graph::{BlockGraph, Connection, ConnectionManager, EdgeKind};

// Block model
pub use crate::block::{Block, BlockKind, ControlSpec, EventSpec, ReplySpec};

// Conditions and runtime values
pub use crate::condition::{Condition, Value};

// Matching
pub use crate::matcher::{EventMatcher, MatchResult, MatchStrategy, PatternSpec};

// Execution
pub use crate::flow::{
    ControlFlowProcessor, ExecutionContext, FlowRunner, MachineState, RunOutcome, Stimulus,
    TraceEntry,
};

// Flex documents
pub use crate::flex::FlexDocument;

// Validation and simulation
pub use crate::simulator::{MessageType, Role, Simulator, SimulatorConfig, TurnMessage};
pub use crate::validate::{auto_fix, validate, Severity, ValidationIssue};

// Errors
pub use crate::error::{ConditionError, ExecError, GraphError};
