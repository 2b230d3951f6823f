//! Proc-macro crate for the `register_block!` register DSL.
//!
//! Generates typed register accessors from a declarative definition. The
//! generated struct borrows a `RegisterPort` and a base offset; every
//! access is routed through the port, so the same definition serves the
//! real mapped window and the simulator.

mod codegen;
mod parse;

use proc_macro::TokenStream;
use syn::parse_macro_input;

use crate::parse::RegisterBlock;

/// Generates a typed register block struct over a `RegisterPort`.
///
/// # Syntax
///
/// ```ignore
/// register_block! {
///     /// Doc comment for the struct.
///     pub StructName {
///         /// Doc comment for the register.
///         [offset; u32; access_mode] name => OptionalBitflagsType,
///     }
/// }
/// ```
///
/// - `offset`: byte offset from the block base (integer literal, e.g. `0x248`)
/// - width: only `u32` is accepted, matching `RegisterPort::read32`
/// - `access_mode`: `ro` (read-only), `wo` (write-only), `rw` (read-write)
/// - `name`: register name (generates method names)
/// - `=> Type`: optional bitflags type (must have `from_bits_retain`/`.bits()`)
///
/// # Generated Code
///
/// For each register, generates:
/// - `ro`/`rw`: `fn name(&self) -> Type` (reader)
/// - `wo`/`rw`: `fn set_name(&self, value: Type)` (posted write) and
///   `fn set_name_barrier(&self, value: Type)` (ordered write)
/// - always: `fn name_offset(&self) -> u32` (absolute offset in the window)
///
/// # Example
///
/// ```ignore
/// use ispif_mmio::register_block;
///
/// register_block! {
///     /// Global ISPIF registers.
///     pub IspifGlobalRegs {
///         /// Reset command, VFE0 bank.
///         [0x008; u32; wo] rst_cmd => ResetCmd,
///         /// Global interrupt clear command.
///         [0x01C; u32; wo] irq_global_clear,
///     }
/// }
/// ```
#[proc_macro]
pub fn register_block(input: TokenStream) -> TokenStream {
    let block = parse_macro_input!(input as RegisterBlock);
    codegen::generate(&block).into()
}
