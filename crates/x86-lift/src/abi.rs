//! 32-bit x86 ABI constants (pointer width, calling convention registers).
//!
//! This module centralizes the target facts shared by the type layout code
//! and the call/return translation.

use crate::x86::Register;

// ── Data Layout ──

/// Size in bytes of a pointer on the 32-bit target.
pub const POINTER_SIZE: u64 = 4;

/// Width in bits of immediates and of the stack cells they are stored to.
pub const WORD_BITS: u32 = 32;

// ── Calling Conventions ──

/// Registers carrying the first two integer arguments under fastcall, in
/// parameter order.
pub const FASTCALL_ARG_REGS: [Register; 2] = [Register::Ecx, Register::Edx];

/// Register holding an integer return value.
pub const RETURN_REG: Register = Register::Eax;

/// Register tested by `JCXZ`, `JECXZ` and `JRCXZ` respectively.
pub const COUNT_REGS: [Register; 3] = [Register::Cx, Register::Ecx, Register::Rcx];
