//! # Runtime
//!
//! This module contains the pieces shared by the [grammar compiler](crate::compiler), the
//! [interpreter](executor::execute) and generated parsers: input cursor, furthest-error diagnostics,
//! line/column computation and semantic values.

mod cursor;
mod data;
mod diagnostics;
mod errors;
mod executor;
mod location;

pub use cursor::*;
pub use data::*;
pub use diagnostics::*;
pub use errors::*;
pub use executor::*;
pub use location::*;
