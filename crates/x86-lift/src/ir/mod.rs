//! Typed intermediate representation produced by the translator.
//!
//! The IR is a small SSA subset modelled on LLVM: machine registers and
//! status flags become stack cells (`alloca`) accessed through `load` and
//! `store`, and every instruction is type-checked by [`Builder`] when it is
//! created. [`Module`] prints as LLVM-flavoured text; with the `llvm` feature
//! it can also be lowered to a real LLVM module.

mod builder;
mod display;
mod instruction;
mod module;
mod types;
mod value;

pub use builder::Builder;
pub use instruction::{BinaryOp, BlockLabel, Inst, InstKind, IntPredicate, Terminator};
pub use module::{BasicBlock, Function, Global, LocalInfo, Module};
pub use types::{CallConv, FuncType, Type};
pub use value::{LocalId, Value, ValueKind};
