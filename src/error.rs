use thiserror::Error;

/// Errors raised while building or editing the block graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Failed to parse designer JSON: {0}")]
    JsonParse(String),

    #[error("Block '{id}' is declared more than once")]
    DuplicateBlock { id: String },

    #[error("Block '{id}' not found in the graph")]
    UnknownBlock { id: String },

    #[error("Block '{id}' is invalid: {message}")]
    InvalidBlock { id: String, message: String },

    #[error("Block '{from}' already has an outgoing '{kind}' edge")]
    DuplicateEdge { from: String, kind: String },

    #[error("A '{kind}' edge from '{from}' to '{to}' would create a cycle in the sequential flow")]
    CycleDetected {
        from: String,
        to: String,
        kind: String,
    },

    #[error("Connection kind '{0}' is not recognized")]
    UnknownEdgeKind(String),
}

/// Errors raised while parsing or evaluating a condition expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    #[error("Failed to parse condition '{expr}': {message}")]
    Parse { expr: String, message: String },

    #[error("Variable '{0}' is not defined in the execution context")]
    UndefinedVariable(String),
}

/// Errors raised while executing blocks during a simulated turn.
///
/// These never escape the simulator: they are routed to the nearest
/// enclosing try scope, or end the turn with the fallback reply.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecError {
    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error("Block '{0}' referenced during execution was not found")]
    UnknownBlock(String),

    #[error("For block '{block_id}' has a zero step value")]
    ZeroStep { block_id: String },
}
