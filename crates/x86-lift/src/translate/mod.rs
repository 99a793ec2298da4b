//! Translation of recovered x86 functions into the typed IR.
//!
//! [`translate_program`] declares every global and function of a [`Program`]
//! and then translates each function body independently. The per-function
//! pipeline lives in the submodules:
//!
//! - `function`: block ordering and the synthesized entry block
//! - `instruction`: non-terminal instructions
//! - `terminator`: branches, jumps and returns
//! - `operand`: operand reads and writes, backed by `cells` (register and
//!   flag storage) and [`globals`] (the global memory model)

mod cells;
mod function;
pub mod globals;
mod instruction;
mod operand;
mod program;
mod terminator;

use std::collections::BTreeMap;

pub use function::translate_function;
pub use program::{BlockInput, FunctionInput, GlobalInput, Program};

use crate::ir::{Function, Global, Module};
use crate::x86::Address;
use crate::{Error, Result};

/// Options for [`translate_program`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Treat unsupported constructs like structural errors: skip the
    /// affected function and continue, instead of aborting the run.
    pub skip_unsupported: bool,
}

/// A function whose body could not be translated.
#[derive(Debug)]
pub struct Failure {
    pub addr: Address,
    pub name: String,
    pub error: Error,
}

/// Result of translating a program. Functions listed in `failures` remain
/// declarations in `module`.
#[derive(Debug)]
pub struct Translation {
    pub module: Module,
    pub failures: Vec<Failure>,
}

/// Build the module skeleton of `program`: every global and every function
/// as a declaration.
pub fn declare_program(program: &Program) -> Result<Module> {
    let mut module = Module::new();
    for input in &program.globals {
        let name = input
            .name
            .clone()
            .unwrap_or_else(|| Global::default_name(input.addr));
        let global = Global::new(name, input.addr, input.ty.clone());
        if module.globals.insert(input.addr, global).is_some() {
            return Err(Error::Duplicate {
                kind: "global variable",
                addr: input.addr,
            });
        }
    }
    for input in &program.functions {
        let name = input
            .name
            .clone()
            .unwrap_or_else(|| Function::default_name(input.entry));
        let func = Function::new(name, input.entry, input.signature(), input.call_conv);
        if module.functions.insert(input.entry, func).is_some() {
            return Err(Error::Duplicate {
                kind: "function",
                addr: input.entry,
            });
        }
    }
    Ok(module)
}

/// Translate every function body of `program`.
///
/// Structural errors are logged and recorded per function. Unsupported
/// constructs abort the run unless `options.skip_unsupported` is set.
pub fn translate_program(program: &Program, options: &TranslateOptions) -> Result<Translation> {
    let mut module = declare_program(program)?;
    let bodies: BTreeMap<Address, &[BlockInput]> = program
        .functions
        .iter()
        .filter_map(|f| f.blocks.as_deref().map(|blocks| (f.entry, blocks)))
        .collect();
    tracing::debug!(
        globals = module.globals.len(),
        functions = module.functions.len(),
        bodies = bodies.len(),
        "translating program"
    );

    let mut defined = Vec::with_capacity(bodies.len());
    let mut failures = Vec::new();
    for (addr, blocks) in bodies {
        let decl = module
            .functions
            .get(&addr)
            .ok_or(Error::FunctionNotFound(addr))?;
        match translate_function(&module, decl, blocks) {
            Ok(func) => defined.push(func),
            Err(error) if error.is_unsupported() && !options.skip_unsupported => {
                return Err(error);
            }
            Err(error) => {
                tracing::warn!(name = %decl.name, %addr, %error, "skipping function");
                failures.push(Failure {
                    addr,
                    name: decl.name.clone(),
                    error,
                });
            }
        }
    }
    for func in defined {
        module.functions.insert(func.addr, func);
    }
    Ok(Translation { module, failures })
}
