//! Test harness for x86-lift unit and integration tests
//!
//! This module provides builders for decoded x86 input and pattern matching
//! over the generated IR. It is available in tests and with the
//! `test-harness` feature.
//!
//! # Example
//!
//! ```rust
//! use x86_lift::ir::{BinaryOp, BlockLabel, Type};
//! use x86_lift::test_harness::*;
//! use x86_lift::x86::{Address, Opcode, Register};
//!
//! let func = function(0x401000, Type::I32).block(
//!     0x401000,
//!     vec![inst(0x401000, 3, Opcode::Add, vec![reg(Register::Eax), imm(5)])],
//!     ret(0x401003),
//! );
//! let ir = translate_single(func, &[], &[]).expect("translation failed");
//!
//! let body = ir.block(BlockLabel::Addr(Address(0x401000))).unwrap();
//! assert_has_pattern(&body.insts, &[
//!     InstPattern::Load { ty: Pat::Exact(Type::I32) },
//!     InstPattern::Binary { op: Pat::Exact(BinaryOp::Add) },
//!     InstPattern::Store { ty: Pat::Exact(Type::I32) },
//! ]);
//! ```

#![allow(
    clippy::cast_possible_wrap,
    clippy::must_use_candidate,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value
)]

use crate::ir::{
    BinaryOp, BlockLabel, CallConv, Function, Inst, InstKind, IntPredicate, Type, ValueKind,
};
use crate::translate::{BlockInput, FunctionInput, GlobalInput, Program, declare_program};
use crate::x86::{Address, Instruction, Mem, Opcode, Operand, Register, Terminator};
use crate::{Error, Result, translate_function};

// ── Input builders ──

pub fn reg(reg: Register) -> Operand {
    Operand::Reg(reg)
}

pub fn imm(value: i64) -> Operand {
    Operand::Imm(value)
}

/// Bare `[disp]` memory operand.
pub fn mem(disp: u64) -> Operand {
    Operand::Mem(Mem::absolute(disp as i64))
}

pub fn inst(addr: u64, len: u32, op: Opcode, args: Vec<Operand>) -> Instruction {
    Instruction::new(addr, len, op, args)
}

/// A relative-target instruction (`Jcc`, `JMP`, `CALL`) at `addr` whose
/// target is the absolute address `target`.
pub fn branch(addr: u64, len: u32, op: Opcode, target: u64) -> Instruction {
    let next = addr + u64::from(len);
    let rel = target.wrapping_sub(next) as i64;
    Instruction::new(addr, len, op, vec![Operand::Rel(rel)])
}

pub fn ret(addr: u64) -> Terminator {
    Terminator::Inst(Instruction::new(addr, 1, Opcode::Ret, Vec::new()))
}

pub fn fallthrough(next: u64) -> Terminator {
    Terminator::Fallthrough(Address(next))
}

/// Terminator form of [`branch`].
pub fn jump(addr: u64, len: u32, op: Opcode, target: u64) -> Terminator {
    Terminator::Inst(branch(addr, len, op, target))
}

pub fn block(addr: u64, insts: Vec<Instruction>, term: Terminator) -> BlockInput {
    BlockInput {
        addr: Address(addr),
        insts,
        term,
    }
}

pub fn global(addr: u64, ty: Type) -> GlobalInput {
    GlobalInput {
        addr: Address(addr),
        ty,
        name: None,
    }
}

/// A function with a body; add blocks with [`FunctionInput::block`].
pub fn function(entry: u64, ret: Type) -> FunctionInput {
    FunctionInput {
        entry: Address(entry),
        name: None,
        ret,
        params: Vec::new(),
        call_conv: CallConv::C,
        blocks: Some(Vec::new()),
    }
}

/// An external function declaration.
pub fn declaration(entry: u64, ret: Type, params: Vec<Type>, call_conv: CallConv) -> FunctionInput {
    FunctionInput {
        entry: Address(entry),
        name: None,
        ret,
        params,
        call_conv,
        blocks: None,
    }
}

impl FunctionInput {
    #[must_use]
    pub fn params(mut self, params: Vec<Type>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn call_conv(mut self, call_conv: CallConv) -> Self {
        self.call_conv = call_conv;
        self
    }

    #[must_use]
    pub fn block(mut self, addr: u64, insts: Vec<Instruction>, term: Terminator) -> Self {
        self.blocks
            .get_or_insert_with(Vec::new)
            .push(block(addr, insts, term));
        self
    }
}

/// Translate `func` alone, with `globals` and the declarations in `externs`
/// visible to it.
pub fn translate_single(
    func: FunctionInput,
    globals: &[GlobalInput],
    externs: &[FunctionInput],
) -> Result<Function> {
    let entry = func.entry;
    let blocks = func.blocks.clone().unwrap_or_default();
    let mut functions = externs.to_vec();
    functions.push(func);
    let program = Program {
        globals: globals.to_vec(),
        functions,
    };
    let module = declare_program(&program)?;
    let decl = module
        .functions
        .get(&entry)
        .ok_or(Error::FunctionNotFound(entry))?;
    translate_function(&module, decl, &blocks)
}

// ── IR patterns ──

/// Pattern matching for instruction fields
#[derive(Debug, Clone)]
pub enum Pat<T> {
    /// Match any value
    Any,
    /// Match exact value
    Exact(T),
    /// Match if value satisfies predicate
    Predicate(fn(&T) -> bool),
}

impl<T: PartialEq> Pat<T> {
    /// Check if a value matches this pattern
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Pat::Any => true,
            Pat::Exact(expected) => value == expected,
            Pat::Predicate(pred) => pred(value),
        }
    }
}

/// Pattern for one IR instruction. Types are the allocated, loaded or
/// stored element types.
#[derive(Debug, Clone)]
pub enum InstPattern {
    Any,
    Alloca { ty: Pat<Type> },
    Load { ty: Pat<Type> },
    Store { ty: Pat<Type> },
    Binary { op: Pat<BinaryOp> },
    ICmp { pred: Pat<IntPredicate> },
    Gep { indices: Pat<Vec<u64>> },
    /// Direct call; `callee` is the function name.
    Call { callee: Pat<String> },
}

impl InstPattern {
    pub fn matches(&self, inst: &Inst) -> bool {
        match (self, &inst.kind) {
            (Self::Any, _) => true,
            (Self::Alloca { ty }, InstKind::Alloca(alloc)) => ty.matches(alloc),
            (Self::Load { ty }, InstKind::Load { ptr }) => {
                ptr.ty.pointee().is_some_and(|elem| ty.matches(elem))
            }
            (Self::Store { ty }, InstKind::Store { value, .. }) => ty.matches(&value.ty),
            (Self::Binary { op }, InstKind::Binary { op: actual, .. }) => op.matches(actual),
            (Self::ICmp { pred }, InstKind::ICmp { pred: actual, .. }) => pred.matches(actual),
            (Self::Gep { indices }, InstKind::GetElementPtr { indices: actual, .. }) => {
                indices.matches(actual)
            }
            (Self::Call { callee }, InstKind::Call { callee: actual, .. }) => match &actual.kind {
                ValueKind::Function { name, .. } => callee.matches(name),
                _ => false,
            },
            _ => false,
        }
    }
}

/// Index of the first occurrence of `pattern` as a contiguous run in `insts`.
pub fn find_pattern(insts: &[Inst], pattern: &[InstPattern]) -> Option<usize> {
    if pattern.is_empty() {
        return Some(0);
    }
    insts.windows(pattern.len()).position(|window| {
        window
            .iter()
            .zip(pattern)
            .all(|(inst, pat)| pat.matches(inst))
    })
}

pub fn assert_has_pattern(insts: &[Inst], pattern: &[InstPattern]) {
    if find_pattern(insts, pattern).is_none() {
        panic!(
            "Pattern not found in instruction sequence.\n\nExpected pattern:\n{pattern:#?}\n\nActual instructions:\n{insts:#?}"
        );
    }
}

/// Assert that `insts` matches `pattern` exactly, instruction by instruction.
pub fn assert_matches(insts: &[Inst], pattern: &[InstPattern]) {
    let matches = insts.len() == pattern.len()
        && insts.iter().zip(pattern).all(|(inst, pat)| pat.matches(inst));
    assert!(
        matches,
        "Instruction sequence does not match.\n\nExpected:\n{pattern:#?}\n\nActual:\n{insts:#?}"
    );
}

/// Labels of `func`'s blocks in emission order.
pub fn block_labels(func: &Function) -> Vec<BlockLabel> {
    func.blocks.iter().map(|block| block.label).collect()
}

/// Number of instructions in `func` matching `pattern`.
pub fn count_matching(func: &Function, pattern: &InstPattern) -> usize {
    func.blocks
        .iter()
        .flat_map(|block| &block.insts)
        .filter(|inst| pattern.matches(inst))
        .count()
}
