use super::{CallConv, LocalId, Type, Value};
use crate::x86::Address;

/// Label of a basic block: the synthetic entry block or the address of the
/// first machine instruction in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockLabel {
    Entry,
    Addr(Address),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Mul,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
}

/// Non-terminator IR instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstKind {
    /// Stack slot holding one value of the given type.
    Alloca(Type),
    Load {
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    Binary {
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
    },
    ICmp {
        pred: IntPredicate,
        lhs: Value,
        rhs: Value,
    },
    /// Element address; `indices` always starts with the zero index that
    /// steps over the base pointer itself.
    GetElementPtr {
        base: Value,
        indices: Vec<u64>,
    },
    Call {
        callee: Value,
        args: Vec<Value>,
        conv: CallConv,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Inst {
    /// Result of the instruction, `None` for `store` and void calls.
    pub result: Option<LocalId>,
    pub kind: InstKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Terminator {
    Br(BlockLabel),
    CondBr {
        cond: Value,
        then_label: BlockLabel,
        else_label: BlockLabel,
    },
    Ret(Option<Value>),
}

impl Terminator {
    /// Successor labels in operand order.
    #[must_use]
    pub fn successors(&self) -> Vec<BlockLabel> {
        match self {
            Terminator::Br(target) => vec![*target],
            Terminator::CondBr {
                then_label,
                else_label,
                ..
            } => vec![*then_label, *else_label],
            Terminator::Ret(_) => Vec::new(),
        }
    }
}
