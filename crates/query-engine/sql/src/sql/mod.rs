//! Building, rendering and parameterizing SQL statements for each supported dialect.

pub mod ast;
pub mod convert;
pub mod dialect;
pub mod helpers;
pub mod string;
