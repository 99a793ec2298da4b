use std::collections::BTreeMap;

use super::{BlockLabel, CallConv, FuncType, Inst, LocalId, Terminator, Type, Value, ValueKind};
use crate::x86::Address;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub label: BlockLabel,
    pub insts: Vec<Inst>,
    pub term: Terminator,
}

/// Type and optional name of an instruction result. Unnamed locals are
/// numbered in emission order when printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInfo {
    pub ty: Type,
    pub name: Option<String>,
}

/// An IR function: a definition once it has blocks, a declaration otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub addr: Address,
    pub sig: FuncType,
    pub call_conv: CallConv,
    pub blocks: Vec<BasicBlock>,
    pub locals: Vec<LocalInfo>,
}

impl Function {
    #[must_use]
    pub fn new(name: impl Into<String>, addr: Address, sig: FuncType, call_conv: CallConv) -> Self {
        Self {
            name: name.into(),
            addr,
            sig,
            call_conv,
            blocks: Vec::new(),
            locals: Vec::new(),
        }
    }

    /// Default name of the function at `addr`.
    #[must_use]
    pub fn default_name(addr: Address) -> String {
        format!("f_{:06X}", addr.0)
    }

    #[must_use]
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Function pointer value referring to this function.
    #[must_use]
    pub fn value(&self) -> Value {
        Value {
            ty: Type::Func(Box::new(self.sig.clone())).pointer_to(),
            kind: ValueKind::Function {
                name: self.name.clone(),
                addr: self.addr,
            },
        }
    }

    /// Value of the `index`th parameter.
    #[must_use]
    pub fn param(&self, index: usize) -> Option<Value> {
        let ty = self.sig.params.get(index)?.clone();
        let index = u32::try_from(index).ok()?;
        Some(Value {
            ty,
            kind: ValueKind::Param(index),
        })
    }

    #[must_use]
    pub fn local(&self, id: LocalId) -> Option<&LocalInfo> {
        self.locals.get(id.0 as usize)
    }

    #[must_use]
    pub fn block(&self, label: BlockLabel) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.label == label)
    }
}

/// A global variable recovered from the executable's data sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub name: String,
    pub addr: Address,
    /// Type of the stored content; the global itself is a pointer to it.
    pub content: Type,
}

impl Global {
    #[must_use]
    pub fn new(name: impl Into<String>, addr: Address, content: Type) -> Self {
        Self {
            name: name.into(),
            addr,
            content,
        }
    }

    #[must_use]
    pub fn default_name(addr: Address) -> String {
        format!("g_{:06X}", addr.0)
    }

    #[must_use]
    pub fn value(&self) -> Value {
        Value {
            ty: self.content.clone().pointer_to(),
            kind: ValueKind::Global(self.name.clone()),
        }
    }
}

/// Translation output: globals and functions ordered by address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub globals: BTreeMap<Address, Global>,
    pub functions: BTreeMap<Address, Function>,
}

impl Module {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
