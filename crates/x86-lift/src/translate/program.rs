//! Input document: recovered functions, their basic blocks and the global
//! variables of the executable, as produced by the decoder front end.

use serde::{Deserialize, Serialize};

use crate::ir::{CallConv, FuncType, Type};
use crate::x86::{Address, Instruction, Terminator};
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub globals: Vec<GlobalInput>,
    #[serde(default)]
    pub functions: Vec<FunctionInput>,
}

impl Program {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A global variable at a fixed address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalInput {
    pub addr: Address,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub name: Option<String>,
}

/// A recovered function.
///
/// `blocks: None` declares an external function that may be called but is
/// not translated; `Some` holds the body, which must not be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInput {
    pub entry: Address,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "void")]
    pub ret: Type,
    #[serde(default)]
    pub params: Vec<Type>,
    #[serde(default)]
    pub call_conv: CallConv,
    #[serde(default)]
    pub blocks: Option<Vec<BlockInput>>,
}

fn void() -> Type {
    Type::Void
}

impl FunctionInput {
    #[must_use]
    pub fn signature(&self) -> FuncType {
        FuncType::new(self.ret.clone(), self.params.clone())
    }
}

/// A basic block: straight-line instructions and exactly one terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInput {
    pub addr: Address,
    #[serde(default)]
    pub insts: Vec<Instruction>,
    pub term: Terminator,
}
