//! Memory operands that address global variables.

use x86_lift::Error;
use x86_lift::ir::{BlockLabel, Function, Type};
use x86_lift::test_harness::*;
use x86_lift::translate::GlobalInput;
use x86_lift::x86::{Address, Instruction, Opcode, Operand, Register};

const ENTRY: u64 = 0x40_1000;

fn run(insts: Vec<Instruction>, globals: &[GlobalInput]) -> x86_lift::Result<Function> {
    let end = insts.last().map_or(ENTRY, |i| i.next_addr().0);
    let func = function(ENTRY, Type::Void).block(ENTRY, insts, ret(end));
    translate_single(func, globals, &[])
}

fn body(func: &Function) -> &[x86_lift::ir::Inst] {
    &func.block(BlockLabel::Addr(Address(ENTRY))).unwrap().insts
}

#[test]
fn test_load_whole_global() {
    let globals = [global(0x40_5000, Type::I32)];
    let ir = run(
        vec![inst(ENTRY, 5, Opcode::Mov, vec![reg(Register::Eax), mem(0x40_5000)])],
        &globals,
    )
    .unwrap();
    assert_matches(
        body(&ir),
        &[
            InstPattern::Load {
                ty: Pat::Exact(Type::I32),
            },
            InstPattern::Store {
                ty: Pat::Exact(Type::I32),
            },
        ],
    );
    assert!(ir.to_string().contains("%0 = load i32, i32* @g_405000"));
}

#[test]
fn test_store_to_global() {
    let globals = [global(0x40_5000, Type::I32)];
    let ir = run(
        vec![inst(ENTRY, 5, Opcode::Mov, vec![mem(0x40_5000), reg(Register::Eax)])],
        &globals,
    )
    .unwrap();
    assert!(ir.to_string().contains("store i32 %0, i32* @g_405000"));
}

#[test]
fn test_array_element_is_indexed() {
    let globals = [global(0x40_5000, Type::I32.array_of(4))];
    let ir = run(
        vec![inst(ENTRY, 5, Opcode::Mov, vec![reg(Register::Eax), mem(0x40_5008)])],
        &globals,
    )
    .unwrap();
    assert_has_pattern(
        body(&ir),
        &[
            InstPattern::Gep {
                indices: Pat::Exact(vec![0, 2]),
            },
            InstPattern::Load {
                ty: Pat::Exact(Type::I32),
            },
        ],
    );
    let text = ir.to_string();
    assert!(
        text.contains("%0 = getelementptr [4 x i32], [4 x i32]* @g_405000, i64 0, i64 2"),
        "{text}"
    );
    assert!(text.contains("%1 = load i32, i32* %0"), "{text}");
}

#[test]
fn test_struct_field_element_is_indexed() {
    let record = Type::Struct(vec![Type::I32, Type::I16.array_of(2)]);
    let globals = [global(0x40_5000, record)];
    let ir = run(
        vec![inst(ENTRY, 6, Opcode::Mov, vec![reg(Register::Ax), mem(0x40_5006)])],
        &globals,
    )
    .unwrap();
    assert_has_pattern(
        body(&ir),
        &[
            InstPattern::Gep {
                indices: Pat::Exact(vec![0, 1, 1]),
            },
            InstPattern::Load {
                ty: Pat::Exact(Type::I16),
            },
            InstPattern::Store {
                ty: Pat::Exact(Type::I16),
            },
        ],
    );
}

#[test]
fn test_relative_operand_reads_global() {
    let globals = [global(0x40_5000, Type::I32)];
    let rel = Operand::Rel(0x40_5000 - 0x40_1006);
    let ir = run(
        vec![inst(ENTRY, 6, Opcode::Add, vec![reg(Register::Eax), rel])],
        &globals,
    )
    .unwrap();
    let text = ir.to_string();
    assert!(text.contains("%1 = load i32, i32* @g_405000"), "{text}");
    assert!(text.contains("%2 = add i32 %0, %1"), "{text}");
}

#[test]
fn test_unknown_address_is_not_found() {
    let globals = [global(0x40_5000, Type::I32.array_of(4))];

    let below = run(
        vec![inst(ENTRY, 5, Opcode::Mov, vec![reg(Register::Eax), mem(0x30_0000)])],
        &globals,
    )
    .unwrap_err();
    assert!(matches!(below, Error::GlobalNotFound(Address(0x30_0000))));

    let past_end = run(
        vec![inst(ENTRY, 5, Opcode::Mov, vec![reg(Register::Eax), mem(0x40_5010)])],
        &globals,
    )
    .unwrap_err();
    assert!(matches!(past_end, Error::GlobalNotFound(Address(0x40_5010))));
    assert!(!past_end.is_unsupported());
}

#[test]
fn test_misaligned_access_is_unsupported() {
    let globals = [global(0x40_5000, Type::I32.array_of(4))];
    let err = run(
        vec![inst(ENTRY, 5, Opcode::Mov, vec![reg(Register::Eax), mem(0x40_5002)])],
        &globals,
    )
    .unwrap_err();
    assert!(err.is_unsupported(), "{err}");
}

#[test]
fn test_whole_aggregate_store_is_type_mismatch() {
    let globals = [global(0x40_5000, Type::I32.array_of(4))];
    let err = run(
        vec![inst(ENTRY, 5, Opcode::Mov, vec![mem(0x40_5000), reg(Register::Eax)])],
        &globals,
    )
    .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { context: "store", .. }));
}

#[test]
fn test_pointer_global_cannot_be_indexed() {
    let globals = [global(0x40_5000, Type::Struct(vec![Type::I32, Type::I32.pointer_to()]))];
    // Field 1 itself is addressable; bytes inside it are not.
    let ir = run(
        vec![inst(ENTRY, 5, Opcode::Mov, vec![reg(Register::Ecx), mem(0x40_5004)])],
        &globals,
    );
    assert!(matches!(ir, Err(Error::TypeMismatch { .. })));

    let err = run(
        vec![inst(ENTRY, 5, Opcode::Mov, vec![reg(Register::Eax), mem(0x40_5006)])],
        &globals,
    )
    .unwrap_err();
    assert!(matches!(err, Error::IndexThroughPointer(_)));
}

#[test]
fn test_oversized_global_is_structural_error() {
    let globals = [global(0x40_4000, Type::I64.array_of(1 << 62))];
    let err = run(
        vec![inst(ENTRY, 5, Opcode::Mov, vec![reg(Register::Eax), mem(0x40_4008)])],
        &globals,
    )
    .unwrap_err();
    assert!(matches!(err, Error::SizeOverflow(_)), "{err}");
    assert!(!err.is_unsupported());
}
