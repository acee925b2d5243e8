//! # Grammar compiler
//!
//! This module contains the compiler, which turns grammar sources into linked syntax trees.
//!
//! These can then be used either with the [generators](`crate::generators`), or with the [interpreter](`crate::runtime`).

pub mod data;
mod errors;
mod linker;
mod parser;
mod report;
mod singles;
mod snippet;
pub(crate) mod utils;

pub use data::*;
pub use errors::*;
pub use linker::link;
pub use parser::*;
pub use report::*;
pub use snippet::*;
