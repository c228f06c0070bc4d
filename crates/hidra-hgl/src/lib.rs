//! Hidra Genesis Language (HGL): the genetic bytecode that sprouts, mutates,
//! and destroys an organism's graph at runtime.
//!
//! Responsibilities:
//! - Parse genome text (hex bytes, genes delimited by the literal `"GN"`) into
//!   raw gene byte slices ([`parse::parse_genome_text`]).
//! - Compile each gene's bytes into a [`ast::GeneNode`] tree ([`parse::compile_genome`]).
//! - Execute a compiled gene against a world through the [`exec::HglContext`]
//!   seam ([`exec::execute_gene`]).
//!
//! Integration points mirror the teacher's NIR/compiler split: `ast` plays
//! the role of `shnn-ir`'s `Operation`/`Module`, and `exec` plays the role of
//! `shnn-compiler`'s verify-then-lower pipeline, generalized from "lower to a
//! `SimulationEngine`" to "execute against a live `HglContext`".

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod error;
pub mod exec;
pub mod parse;

pub use ast::{CompiledGenome, Gene, GeneNode, GeneOp, GeneOperand, SignalKind};
pub use error::{HglError, Result};
pub use exec::{execute_gene, HglContext};
pub use parse::{compile_genome, parse_genome_text, Genome};

/// HGL crate version for compatibility checking.
pub const HGL_VERSION: u32 = 1;
