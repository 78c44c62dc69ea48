//! # Taiwa - Block-Graph Compilation and Simulation Engine
//!
//! **Taiwa** compiles the block graphs produced by a visual chat-bot designer
//! into an executable form and simulates conversations against them. Blocks
//! (events, replies, control flow, settings, Flex fragments) are nodes; typed
//! connections (`next`, `then`/`else`, `loop-body`, `catch`/`finally`,
//! `case:N`) are the edges flow follows at runtime.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: Parse the designer's JSON document into a [`graph::BlockGraph`].
//!     Parsing is strict about structure (unknown blocks, duplicate ids,
//!     cycles through sequential edges) and lenient about content.
//! 2.  **Validate**: Run [`validate::validate`] for the full advisory rule
//!     battery, and optionally [`validate::auto_fix`] for the safe subset.
//! 3.  **Simulate**: Feed [`flow::Stimulus`] values into a
//!     [`simulator::Simulator`] and collect the bot's side of the transcript.
//! 4.  **Export**: [`codegen::generate_code`] renders the graph as a LINE-bot
//!     JavaScript snippet via the static block catalog.
//!
//! Execution is deterministic: waits advance a simulated clock instead of
//! sleeping, loops are hard-capped, and matching ties break by declaration
//! order. The same graph and stimulus sequence always produce the same
//! transcript.
//!
//! ## Quick Start
//!
//! ```rust
//! use taiwa::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let designer_json = r#"{
//!         "blocks": [
//!             {"id": "ev1", "blockType": "event",
//!              "blockData": {"eventType": "message.text", "condition": "價格",
//!                            "matchType": "contains"}},
//!             {"id": "r1", "blockType": "reply",
//!              "blockData": {"replyType": "text", "text": "我們的價格是..."}}
//!         ],
//!         "connections": [
//!             {"fromBlockId": "ev1", "toBlockId": "r1", "connectionType": "next"}
//!         ]
//!     }"#;
//!
//!     let graph = BlockGraph::from_json(designer_json)?;
//!     let mut simulator = Simulator::new(graph);
//!
//!     let replies = simulator.send(Stimulus::text("請問價格"));
//!     assert_eq!(replies[0].content, "我們的價格是...");
//!     Ok(())
//! }
//! ```

pub mod block;
pub mod codegen;
pub mod condition;
pub mod error;
pub mod flex;
pub mod flow;
pub mod graph;
pub mod matcher;
pub mod prelude;
pub mod simulator;
pub mod validate;
