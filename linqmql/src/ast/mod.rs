//! The aggregation expression tree produced by the translator, together
//! with its folding constructors, a rewriting visitor and the
//! simplification passes run before rendering.

mod constructors;
mod definitions;
pub use constructors::ROOT;
pub use definitions::*;
pub mod simplifier;
pub mod visitor;

#[cfg(test)]
mod test;
