//! The host expression tree handed to the compiler: typed lambdas, member
//! accesses, method calls and operators.

mod definitions;
pub use definitions::*;
pub mod builder;
mod display;

#[cfg(test)]
mod test;
