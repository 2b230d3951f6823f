//! Code generation for the `register_block!` macro.
//!
//! Transforms the parsed register block definition into a struct with typed
//! accessor methods routed through a `RegisterPort`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::parse::{RegisterBlock, RegisterDef};

/// Generates the complete output for a register block definition.
pub fn generate(block: &RegisterBlock) -> TokenStream {
    let vis = &block.vis;
    let name = &block.name;
    let attrs = &block.attrs;

    let methods: Vec<TokenStream> = block.registers.iter().map(generate_methods).collect();

    quote! {
        #(#attrs)*
        #[derive(Clone, Copy)]
        #vis struct #name<'a> {
            port: &'a dyn ::ispif_mmio::RegisterPort,
            base: u32,
        }

        impl<'a> #name<'a> {
            /// Creates a register block accessor at `base` within `port`'s window.
            #[must_use]
            #vis fn new(port: &'a dyn ::ispif_mmio::RegisterPort, base: u32) -> Self {
                Self { port, base }
            }

            /// Returns the base offset of this block within the window.
            #[must_use]
            #vis fn base(&self) -> u32 {
                self.base
            }

            #(#methods)*
        }
    }
}

/// Generates accessor methods for a single register.
fn generate_methods(reg: &RegisterDef) -> TokenStream {
    let mut methods = generate_offset(reg);

    if reg.access.readable() {
        methods.extend(generate_read(reg));
    }
    if reg.access.writable() {
        methods.extend(generate_write(reg, false));
        methods.extend(generate_write(reg, true));
    }

    methods
}

/// Generates the absolute-offset helper for a register.
fn generate_offset(reg: &RegisterDef) -> TokenStream {
    let offset_name = format_ident!("{}_offset", reg.name);
    let offset = &reg.offset;
    let doc = format!("Returns the absolute offset of the `{}` register.", reg.name);

    quote! {
        #[doc = #doc]
        #[inline]
        #[must_use]
        pub fn #offset_name(&self) -> u32 {
            self.base + #offset
        }
    }
}

/// Generates the read accessor for a register.
fn generate_read(reg: &RegisterDef) -> TokenStream {
    let name = &reg.name;
    let offset = &reg.offset;
    let attrs = &reg.attrs;

    if let Some(ref bf_type) = reg.bitflags_type {
        quote! {
            #(#attrs)*
            #[inline]
            #[must_use]
            pub fn #name(&self) -> #bf_type {
                #bf_type::from_bits_retain(self.port.read32(self.base + #offset))
            }
        }
    } else {
        quote! {
            #(#attrs)*
            #[inline]
            #[must_use]
            pub fn #name(&self) -> u32 {
                self.port.read32(self.base + #offset)
            }
        }
    }
}

/// Generates a write accessor for a register.
///
/// With `barrier` set, the setter is named `set_<name>_barrier` and uses the
/// port's ordered write.
fn generate_write(reg: &RegisterDef, barrier: bool) -> TokenStream {
    let name = &reg.name;
    let offset = &reg.offset;

    let (setter_name, port_call, set_doc) = if barrier {
        (
            format_ident!("set_{}_barrier", name),
            quote! { write32_barrier },
            format!(
                "Writes the `{name}` register, ordered before any later access."
            ),
        )
    } else {
        (
            format_ident!("set_{}", name),
            quote! { write32 },
            format!("Writes the `{name}` register."),
        )
    };

    let value = if reg.bitflags_type.is_some() {
        quote! { value.bits() }
    } else {
        quote! { value }
    };
    let value_ty = match reg.bitflags_type {
        Some(ref bf_type) => quote! { #bf_type },
        None => quote! { u32 },
    };

    quote! {
        #[doc = #set_doc]
        #[inline]
        pub fn #setter_name(&self, value: #value_ty) {
            self.port.#port_call(self.base + #offset, #value);
        }
    }
}
