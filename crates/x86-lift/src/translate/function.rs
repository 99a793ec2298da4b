//! Function/block assembler: translates every block of a recovered function
//! and prepends the entry block that declares the register and flag cells.

use std::collections::BTreeMap;

use super::cells::Cells;
use super::program::BlockInput;
use crate::abi::FASTCALL_ARG_REGS;
use crate::ir::{BasicBlock, BlockLabel, Builder, CallConv, Function, Module};
use crate::x86::Address;
use crate::{Error, Result};

/// Translation state of one function.
pub(super) struct FunctionTranslator<'a> {
    /// Globals and function declarations of the whole program (read-only).
    pub(super) module: &'a Module,
    /// Declaration of the function being translated.
    pub(super) func: &'a Function,
    pub(super) blocks: BTreeMap<Address, &'a BlockInput>,
    pub(super) cells: Cells,
    pub(super) builder: Builder,
}

/// Translate the body of `decl` from its basic blocks.
///
/// `module` supplies the globals and the functions that may be called or
/// referenced. Blocks may be given in any order; they are translated and
/// emitted in address order. The returned function is `decl` with blocks.
pub fn translate_function(
    module: &Module,
    decl: &Function,
    blocks: &[BlockInput],
) -> Result<Function> {
    tracing::debug!(name = %decl.name, addr = %decl.addr, "translating function");
    let mut by_addr = BTreeMap::new();
    for block in blocks {
        if by_addr.insert(block.addr, block).is_some() {
            return Err(Error::Duplicate {
                kind: "basic block",
                addr: block.addr,
            });
        }
    }
    let translator = FunctionTranslator {
        module,
        func: decl,
        blocks: by_addr,
        cells: Cells::default(),
        builder: Builder::new(),
    };
    translator.assemble()
}

impl FunctionTranslator<'_> {
    fn assemble(mut self) -> Result<Function> {
        let inputs: Vec<&BlockInput> = self.blocks.values().copied().collect();
        let mut body = Vec::with_capacity(inputs.len() + 1);
        for block in inputs {
            body.push(self.translate_block(block)?);
        }
        let Some(first) = body.first().map(|block| block.label) else {
            return Err(Error::MissingFunctionBody(self.func.addr));
        };

        if !self.cells.is_empty() {
            let entry = self.entry_block(first)?;
            body.insert(0, entry);
        }

        let mut func = self.func.clone();
        func.blocks = body;
        func.locals = self.builder.into_locals();
        Ok(func)
    }

    fn translate_block(&mut self, block: &BlockInput) -> Result<BasicBlock> {
        tracing::debug!(addr = %block.addr, "translating basic block");
        for inst in &block.insts {
            self.translate_inst(inst)?;
        }
        let term = self.translate_term(&block.term)?;
        Ok(self
            .builder
            .finish_block(BlockLabel::Addr(block.addr), term))
    }

    /// Entry block: cell declarations, fastcall argument unpacking, and a
    /// branch to the first real block.
    fn entry_block(&mut self, first: BlockLabel) -> Result<BasicBlock> {
        let mut arg_stores = Vec::new();
        if self.func.call_conv == CallConv::Fastcall {
            for (index, reg) in FASTCALL_ARG_REGS.into_iter().enumerate() {
                if let (Some(param), Some(cell)) =
                    (self.func.param(index), self.cells.existing_register(reg))
                {
                    arg_stores.push((param, cell.clone()));
                }
            }
        }
        for alloca in std::mem::take(&mut self.cells).into_allocas() {
            self.builder.append(alloca);
        }
        for (param, cell) in arg_stores {
            self.builder.build_store(param, &cell)?;
        }
        let term = self.builder.build_br(first);
        Ok(self.builder.finish_block(BlockLabel::Entry, term))
    }

    /// Label of the block starting at `addr` within this function.
    pub(super) fn block_label(&self, addr: Address) -> Result<BlockLabel> {
        if self.blocks.contains_key(&addr) {
            Ok(BlockLabel::Addr(addr))
        } else {
            Err(Error::BlockNotFound(addr))
        }
    }
}
