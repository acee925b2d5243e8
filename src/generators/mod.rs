//! # Generators
//!
//! This module contains generators for [linked grammars](`super::compiler::parse_grammar`).

pub mod peg;

#[cfg(feature = "rustgen")]
pub mod rust;

pub use self::peg::gen_peg;

#[cfg(feature = "rustgen")]
pub use self::rust::*;
