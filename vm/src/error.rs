use bytecode::DecodeError;
use object::Value;
use thiserror::Error;

/// Recoverable failures of a running context.
///
/// These abort the failing context and every context above it up to the
/// caller of [`Vm::execute_method`](crate::Vm::execute_method) or
/// [`Vm::send`](crate::Vm::send). Broken invariants such as stack underflow
/// or an object without a class panic instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    // ── bounds ─────────────────────────────────────────────────────
    #[error("literal index {index} out of bounds (literal table has {len})")]
    LiteralOutOfBounds { index: usize, len: usize },

    #[error("instance variable index {index} out of bounds (object has {len})")]
    InstanceVariableOutOfBounds { index: usize, len: usize },

    #[error("temporary variable index out of bounds: {index}")]
    TemporaryVariableOutOfBounds { index: usize },

    #[error("jump target {target} outside bytecode of length {len}")]
    JumpOutOfBounds { target: i64, len: usize },

    #[error("malformed bytecode: {0}")]
    Decode(#[from] DecodeError),

    // ── type ───────────────────────────────────────────────────────
    #[error("selector literal is not a symbol: {got:?}")]
    SelectorNotSymbol { got: Value },

    #[error("expected {expected}, got {got:?}")]
    TypeError { expected: &'static str, got: Value },

    // ── lookup ─────────────────────────────────────────────────────
    #[error("method not found: {class}>>{selector}")]
    MethodNotFound { class: String, selector: String },

    #[error("nil receiver for #{selector}")]
    NilReceiver { selector: String },

    // ── resources ──────────────────────────────────────────────────
    #[error("activation depth limit of {limit} exceeded")]
    StackDepthExceeded { limit: usize },
}
