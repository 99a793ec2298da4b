//! Whole-program translation: declarations, per-function failure handling
//! and deterministic output.

use x86_lift::ir::{BlockLabel, CallConv, Type};
use x86_lift::test_harness::*;
use x86_lift::translate::{Program, declare_program};
use x86_lift::x86::{Address, Opcode, Register};
use x86_lift::{Error, TranslateOptions, translate_program};

const DOCUMENT: &str = r#"{
    "globals": [
        { "addr": "0x405000", "type": "[4 x i32]", "name": "table" }
    ],
    "functions": [
        { "entry": "0x402000", "name": "helper", "ret": "i32",
          "params": ["i32"], "call_conv": "fastcall" },
        {
            "entry": "0x401000",
            "name": "main",
            "ret": "i32",
            "blocks": [
                {
                    "addr": "0x401000",
                    "insts": [
                        { "addr": "0x401000", "len": 5, "op": "MOV",
                          "args": [{ "reg": "ECX" }, { "mem": { "disp": 4214788 } }] },
                        { "addr": "0x401005", "len": 5, "op": "CALL",
                          "args": [{ "rel": 4086 }] }
                    ],
                    "term": { "inst": { "addr": "0x40100A", "len": 1, "op": "RET" } }
                }
            ]
        }
    ]
}"#;

#[test]
fn test_json_document_end_to_end() {
    let program = Program::from_json(DOCUMENT).unwrap();
    let translation = translate_program(&program, &TranslateOptions::default()).unwrap();
    assert!(translation.failures.is_empty());

    let text = translation.module.to_string();
    assert!(
        text.starts_with("@table = external global [4 x i32] ; 0x00405000\n"),
        "{text}"
    );
    assert!(text.contains("; main at 0x00401000\ndefine i32 @main() {"), "{text}");
    assert!(
        text.contains("; helper at 0x00402000\ndeclare x86_fastcallcc i32 @helper(i32)"),
        "{text}"
    );
    assert!(
        text.contains("getelementptr [4 x i32], [4 x i32]* @table, i64 0, i64 1"),
        "{text}"
    );
    assert!(text.contains("call x86_fastcallcc i32 @helper(i32 "), "{text}");
}

#[test]
fn test_structural_failure_keeps_declaration() {
    // Falls through into a block that was never recovered.
    let broken = function(0x40_1000, Type::Void).block(0x40_1000, vec![], fallthrough(0x40_1004));
    let fine = function(0x40_2000, Type::Void).block(0x40_2000, vec![], ret(0x40_2000));
    let program = Program {
        globals: Vec::new(),
        functions: vec![broken, fine],
    };

    let translation = translate_program(&program, &TranslateOptions::default()).unwrap();
    assert_eq!(translation.failures.len(), 1);
    let failure = &translation.failures[0];
    assert_eq!(failure.addr, Address(0x40_1000));
    assert_eq!(failure.name, "f_401000");
    assert!(matches!(failure.error, Error::BlockNotFound(Address(0x40_1004))));

    let module = &translation.module;
    assert!(module.functions[&Address(0x40_1000)].is_declaration());
    assert!(!module.functions[&Address(0x40_2000)].is_declaration());
}

#[test]
fn test_empty_body_is_recorded() {
    let program = Program {
        globals: Vec::new(),
        functions: vec![function(0x40_1000, Type::Void)],
    };
    let translation = translate_program(&program, &TranslateOptions::default()).unwrap();
    assert!(matches!(
        translation.failures[0].error,
        Error::MissingFunctionBody(Address(0x40_1000))
    ));
}

fn with_unsupported() -> Program {
    let lea = inst(
        0x40_1000,
        6,
        Opcode::from("LEA".to_string()),
        vec![reg(Register::Eax), mem(0x40_5000)],
    );
    let bad = function(0x40_1000, Type::Void).block(0x40_1000, vec![lea], ret(0x40_1006));
    let good = function(0x40_2000, Type::Void).block(0x40_2000, vec![], ret(0x40_2000));
    Program {
        globals: Vec::new(),
        functions: vec![bad, good],
    }
}

#[test]
fn test_unsupported_aborts_by_default() {
    let err = translate_program(&with_unsupported(), &TranslateOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOpcode(_)));
}

#[test]
fn test_skip_unsupported_records_failure() {
    let options = TranslateOptions {
        skip_unsupported: true,
    };
    let translation = translate_program(&with_unsupported(), &options).unwrap();
    assert_eq!(translation.failures.len(), 1);
    assert!(translation.failures[0].error.is_unsupported());
    assert!(translation.module.functions[&Address(0x40_1000)].is_declaration());
    assert!(!translation.module.functions[&Address(0x40_2000)].is_declaration());
}

#[test]
fn test_duplicates_are_rejected() {
    let program = Program {
        globals: vec![global(0x40_5000, Type::I32), global(0x40_5000, Type::I8)],
        functions: Vec::new(),
    };
    assert!(matches!(
        declare_program(&program),
        Err(Error::Duplicate {
            kind: "global variable",
            ..
        })
    ));

    let program = Program {
        globals: Vec::new(),
        functions: vec![
            declaration(0x40_2000, Type::Void, vec![], CallConv::C),
            function(0x40_2000, Type::Void).block(0x40_2000, vec![], ret(0x40_2000)),
        ],
    };
    assert!(matches!(
        translate_program(&program, &TranslateOptions::default()),
        Err(Error::Duplicate { kind: "function", .. })
    ));

    let repeated_block = function(0x40_1000, Type::Void)
        .block(0x40_1000, vec![], ret(0x40_1000))
        .block(0x40_1000, vec![], ret(0x40_1000));
    assert!(matches!(
        translate_single(repeated_block, &[], &[]),
        Err(Error::Duplicate { .. })
    ));
}

#[test]
fn test_blocks_are_emitted_in_address_order() {
    let func = function(0x40_1000, Type::I32)
        .block(0x40_1010, vec![], ret(0x40_1010))
        .block(0x40_1004, vec![], fallthrough(0x40_1010))
        .block(0x40_1000, vec![], fallthrough(0x40_1004));
    let ir = translate_single(func, &[], &[]).unwrap();
    assert_eq!(
        block_labels(&ir),
        vec![
            BlockLabel::Entry,
            BlockLabel::Addr(Address(0x40_1000)),
            BlockLabel::Addr(Address(0x40_1004)),
            BlockLabel::Addr(Address(0x40_1010)),
        ]
    );
    assert_eq!(ir.blocks[0].term, x86_lift::ir::Terminator::Br(ir.blocks[1].label));
}

#[test]
fn test_translation_is_deterministic() {
    let program = Program::from_json(DOCUMENT).unwrap();
    let first = translate_program(&program, &TranslateOptions::default()).unwrap();
    let second = translate_program(&program, &TranslateOptions::default()).unwrap();
    assert_eq!(first.module, second.module);
    assert_eq!(first.module.to_string(), second.module.to_string());
}

#[test]
fn test_oversized_global_does_not_abort() {
    let json = r#"{
        "globals": [{ "addr": "0x404000", "type": "[4611686018427387904 x i64]" }],
        "functions": [{
            "entry": "0x401000",
            "blocks": [{
                "addr": "0x401000",
                "insts": [{ "addr": "0x401000", "len": 5, "op": "MOV",
                            "args": [{ "reg": "EAX" }, { "mem": { "disp": 4210696 } }] }],
                "term": { "inst": { "addr": "0x401005", "len": 1, "op": "RET" } }
            }]
        }]
    }"#;
    let program = Program::from_json(json).unwrap();
    let translation = translate_program(&program, &TranslateOptions::default()).unwrap();
    assert_eq!(translation.failures.len(), 1);
    assert!(matches!(translation.failures[0].error, Error::SizeOverflow(_)));
    assert!(translation.module.functions[&Address(0x40_1000)].is_declaration());
}
