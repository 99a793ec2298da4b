#![allow(
    clippy::module_name_repetitions, // `ir::IrType`-style names read worse than the repetition
    clippy::missing_errors_doc // every fallible operation returns the crate `Error`
)]

//! Translation of recovered 32-bit x86 functions into a typed, SSA-style IR.
//!
//! The input is already decoded: functions partitioned into basic blocks of
//! [`x86::Instruction`]s, plus the global variables and function signatures
//! of the executable (see [`translate::Program`]). The output is an
//! [`ir::Module`] whose functions keep the machine's registers and status
//! flags in stack cells, ready for `mem2reg`-style promotion downstream.
//!
//! ```
//! use x86_lift::translate::{Program, TranslateOptions, translate_program};
//!
//! let program = Program::from_json(r#"{
//!     "functions": [{
//!         "entry": "0x401000",
//!         "ret": "i32",
//!         "blocks": [{
//!             "addr": "0x401000",
//!             "insts": [{ "addr": "0x401000", "len": 3, "op": "ADD",
//!                         "args": [{ "reg": "EAX" }, { "imm": 5 }] }],
//!             "term": { "inst": { "addr": "0x401003", "len": 1, "op": "RET" } }
//!         }]
//!     }]
//! }"#).unwrap();
//! let translation = translate_program(&program, &TranslateOptions::default()).unwrap();
//! assert!(translation.failures.is_empty());
//! assert!(translation.module.to_string().contains("add i32"));
//! ```

pub mod abi;
pub mod error;
pub mod ir;
#[cfg(feature = "llvm")]
pub mod llvm_backend;
pub mod translate;
pub mod x86;

/// Test harness module for writing unit and integration tests.
///
/// This module is only available when running tests or when the
/// `test-harness` feature is enabled.
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use error::{Error, Result};
pub use translate::{TranslateOptions, Translation, translate_function, translate_program};
