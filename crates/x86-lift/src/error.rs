use crate::ir::Type;
use crate::x86::{Address, Opcode, Register};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Structural failures (recoverable per function) ──
    #[error("invalid function definition at {0}; missing function body")]
    MissingFunctionBody(Address),

    #[error("unable to locate basic block at {0}")]
    BlockNotFound(Address),

    #[error("unable to locate global variable at {0}")]
    GlobalNotFound(Address),

    #[error("unable to locate function at {0}")]
    FunctionNotFound(Address),

    #[error("invalid callee type at {addr}; expected function, got {found}")]
    InvalidCallee { addr: Address, found: Type },

    #[error("operand {index} of {op} at {addr} is not a writable destination")]
    NotWritable {
        addr: Address,
        op: Opcode,
        index: usize,
    },

    #[error("{op} at {addr} expects {expected} operands, got {found}")]
    OperandCount {
        addr: Address,
        op: Opcode,
        expected: usize,
        found: usize,
    },

    #[error("unable to index into element of pointer type {0}")]
    IndexThroughPointer(Type),

    #[error("offset {offset} lies outside of type {ty}")]
    OffsetOutOfRange { offset: u64, ty: Type },

    #[error("type {0} has no size")]
    Unsized(Type),

    #[error("size of type {0} overflows")]
    SizeOverflow(Type),

    #[error("type mismatch in {context}; expected {expected}, got {found}")]
    TypeMismatch {
        context: &'static str,
        expected: Type,
        found: Type,
    },

    #[error("invalid type syntax {0:?}")]
    TypeSyntax(String),

    #[error("invalid address {0:?}")]
    AddressSyntax(String),

    #[error("duplicate {kind} at {addr}")]
    Duplicate { kind: &'static str, addr: Address },

    #[error("invalid input document: {0}")]
    Input(#[from] serde_json::Error),

    // ── Unsupported constructs (fatal by default) ──
    #[error("support for instruction opcode {0} not yet implemented")]
    UnsupportedOpcode(Opcode),

    #[error("support for terminator opcode {0} not yet implemented")]
    UnsupportedTerminator(Opcode),

    #[error("support for conditional branch instruction with opcode {0} not yet implemented")]
    UnsupportedCondition(Opcode),

    #[error("support for register {0} not yet implemented")]
    UnsupportedRegister(Register),

    #[error("support for operand {0} not yet implemented")]
    UnsupportedOperand(String),

    #[error("support for indexing element type {0} not yet implemented")]
    UnsupportedIndexing(Type),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error stems from a construct with no defined translation
    /// rule, as opposed to a structural failure of the input.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOpcode(_)
                | Self::UnsupportedTerminator(_)
                | Self::UnsupportedCondition(_)
                | Self::UnsupportedRegister(_)
                | Self::UnsupportedOperand(_)
                | Self::UnsupportedIndexing(_)
                | Self::Unsupported(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
