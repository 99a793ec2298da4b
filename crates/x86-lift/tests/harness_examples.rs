//! Example tests demonstrating the test harness
//!
//! This file shows various ways to use the `test_harness` module for
//! testing the translation of decoded x86 functions.

use x86_lift::Error;
use x86_lift::ir::{BinaryOp, BlockLabel, CallConv, IntPredicate, Terminator, Type};
use x86_lift::test_harness::*;
use x86_lift::x86::{Address, Mem, Opcode, Operand, Register};

fn label(addr: u64) -> BlockLabel {
    BlockLabel::Addr(Address(addr))
}

// =============================================================================
// Basic Pattern Matching Examples
// =============================================================================

#[test]
fn test_add_then_return() {
    let func = function(0x40_1000, Type::I32).block(
        0x40_1000,
        vec![inst(0x40_1000, 3, Opcode::Add, vec![reg(Register::Eax), imm(5)])],
        ret(0x40_1003),
    );
    let ir = translate_single(func, &[], &[]).expect("Failed to translate");

    assert_eq!(block_labels(&ir), vec![BlockLabel::Entry, label(0x40_1000)]);

    let entry = ir.block(BlockLabel::Entry).unwrap();
    assert_matches(
        &entry.insts,
        &[InstPattern::Alloca {
            ty: Pat::Exact(Type::I32),
        }],
    );
    assert_eq!(entry.term, Terminator::Br(label(0x40_1000)));

    let body = ir.block(label(0x40_1000)).unwrap();
    assert_matches(
        &body.insts,
        &[
            InstPattern::Load {
                ty: Pat::Exact(Type::I32),
            },
            InstPattern::Binary {
                op: Pat::Exact(BinaryOp::Add),
            },
            InstPattern::Store {
                ty: Pat::Exact(Type::I32),
            },
            InstPattern::Load {
                ty: Pat::Exact(Type::I32),
            },
        ],
    );
    assert!(matches!(body.term, Terminator::Ret(Some(_))));
}

#[test]
fn test_textual_ir() {
    let func = function(0x40_1000, Type::I32).block(
        0x40_1000,
        vec![inst(0x40_1000, 3, Opcode::Add, vec![reg(Register::Eax), imm(5)])],
        ret(0x40_1003),
    );
    let ir = translate_single(func, &[], &[]).expect("Failed to translate");

    let expected = "\
; f_401000 at 0x00401000
define i32 @f_401000() {
entry:
  %eax = alloca i32
  br label %block_401000

block_401000:
  %0 = load i32, i32* %eax
  %1 = add i32 %0, 5
  store i32 %1, i32* %eax
  %2 = load i32, i32* %eax
  ret i32 %2
}
";
    assert_eq!(ir.to_string(), expected);
}

#[test]
fn test_missing_function_body() {
    let func = function(0x40_1000, Type::Void);
    let err = translate_single(func, &[], &[]).unwrap_err();
    assert!(matches!(err, Error::MissingFunctionBody(Address(0x40_1000))));
    assert!(err.to_string().contains("missing function body"));
    assert!(!err.is_unsupported());
}

#[test]
fn test_cmp_then_jne() {
    let func = function(0x40_1000, Type::Void)
        .block(
            0x40_1000,
            vec![inst(0x40_1000, 3, Opcode::Cmp, vec![imm(7), imm(7)])],
            jump(0x40_1003, 2, Opcode::Jne, 0x40_1010),
        )
        .block(0x40_1005, vec![], ret(0x40_1005))
        .block(0x40_1010, vec![], ret(0x40_1010));
    let ir = translate_single(func, &[], &[]).expect("Failed to translate");

    let entry = ir.block(BlockLabel::Entry).unwrap();
    assert_matches(
        &entry.insts,
        &[
            InstPattern::Alloca {
                ty: Pat::Exact(Type::I1),
            },
            InstPattern::Alloca {
                ty: Pat::Exact(Type::I1),
            },
        ],
    );

    let block = ir.block(label(0x40_1000)).unwrap();
    assert_matches(
        &block.insts,
        &[
            InstPattern::ICmp {
                pred: Pat::Exact(IntPredicate::Eq),
            },
            InstPattern::Store {
                ty: Pat::Exact(Type::I1),
            },
            InstPattern::ICmp {
                pred: Pat::Exact(IntPredicate::Slt),
            },
            InstPattern::Store {
                ty: Pat::Exact(Type::I1),
            },
            InstPattern::Load {
                ty: Pat::Exact(Type::I1),
            },
            InstPattern::ICmp {
                pred: Pat::Exact(IntPredicate::Eq),
            },
        ],
    );
    match &block.term {
        Terminator::CondBr {
            then_label,
            else_label,
            ..
        } => {
            assert_eq!(*then_label, label(0x40_1010));
            assert_eq!(*else_label, label(0x40_1005));
        }
        other => panic!("expected conditional branch, got {other:?}"),
    }

    let text = ir.to_string();
    assert!(text.contains("  %zf = alloca i1\n  %sf = alloca i1\n"));
    assert!(text.contains("icmp eq i32 7, 7"));
    assert!(text.contains("icmp eq i1 %2, false"));
    assert!(text.contains("br i1 %3, label %block_401010, label %block_401005"));
}

#[test]
fn test_memory_operand_with_base_register_is_unsupported() {
    let src = Operand::Mem(Mem {
        base: Some(Register::Ebx),
        disp: 4,
        ..Mem::default()
    });
    let func = function(0x40_1000, Type::Void).block(
        0x40_1000,
        vec![inst(0x40_1000, 3, Opcode::Mov, vec![reg(Register::Eax), src])],
        ret(0x40_1003),
    );
    let err = translate_single(func, &[], &[]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperand(_)));
    assert!(err.is_unsupported());
}

// =============================================================================
// Calling Conventions
// =============================================================================

#[test]
fn test_fastcall_prologue_stores_arguments() {
    let func = function(0x40_1000, Type::I32)
        .params(vec![Type::I32, Type::I32])
        .call_conv(CallConv::Fastcall)
        .block(
            0x40_1000,
            vec![
                inst(0x40_1000, 2, Opcode::Add, vec![reg(Register::Ecx), reg(Register::Edx)]),
                inst(0x40_1002, 2, Opcode::Mov, vec![reg(Register::Eax), reg(Register::Ecx)]),
            ],
            ret(0x40_1004),
        );
    let ir = translate_single(func, &[], &[]).expect("Failed to translate");

    let text = ir.to_string();
    let entry = "\
define x86_fastcallcc i32 @f_401000(i32 %0, i32 %1) {
entry:
  %eax = alloca i32
  %ecx = alloca i32
  %edx = alloca i32
  store i32 %0, i32* %ecx
  store i32 %1, i32* %edx
  br label %block_401000
";
    assert!(text.contains(entry), "unexpected entry block:\n{text}");
}

#[test]
fn test_fastcall_prologue_skips_unused_registers() {
    let func = function(0x40_1000, Type::I32)
        .params(vec![Type::I32, Type::I32])
        .call_conv(CallConv::Fastcall)
        .block(
            0x40_1000,
            vec![inst(0x40_1000, 2, Opcode::Mov, vec![reg(Register::Eax), reg(Register::Ecx)])],
            ret(0x40_1002),
        );
    let ir = translate_single(func, &[], &[]).expect("Failed to translate");
    let entry = ir.block(BlockLabel::Entry).unwrap();
    assert_matches(
        &entry.insts,
        &[
            InstPattern::Alloca { ty: Pat::Any },
            InstPattern::Alloca { ty: Pat::Any },
            InstPattern::Store {
                ty: Pat::Exact(Type::I32),
            },
        ],
    );
    assert!(!ir.to_string().contains("%edx"));
}

#[test]
fn test_no_cells_means_no_entry_block() {
    let func = function(0x40_1000, Type::Void).block(
        0x40_1000,
        vec![
            inst(0x40_1000, 1, Opcode::Push, vec![reg(Register::Ebp)]),
            inst(0x40_1001, 1, Opcode::Pop, vec![reg(Register::Ebp)]),
        ],
        ret(0x40_1002),
    );
    let ir = translate_single(func, &[], &[]).expect("Failed to translate");
    assert_eq!(block_labels(&ir), vec![label(0x40_1000)]);
    assert!(ir.blocks[0].insts.is_empty());
    assert_eq!(ir.blocks[0].term, Terminator::Ret(None));
}
