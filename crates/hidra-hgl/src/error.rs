//! Error types for genome parsing and gene execution

use thiserror::Error;

/// Result type for HGL operations
pub type Result<T> = std::result::Result<T, HglError>;

/// Errors that can occur while parsing or executing a genome
#[derive(Error, Debug)]
pub enum HglError {
    /// Gene 0 (Genesis) was not present in the genome
    #[error("genome is missing the mandatory Genesis gene (gene 0)")]
    MissingGenesis,

    /// A gene's bytecode ended before a node's expected operands/children were read
    #[error("gene {gene_id} is truncated at byte offset {offset}")]
    Truncated {
        /// The gene that was truncated
        gene_id: usize,
        /// Byte offset into the gene where decoding stopped
        offset: usize,
    },

    /// An opcode byte did not match any known instruction
    #[error("gene {gene_id} has an unrecognized opcode 0x{opcode:02X} at byte offset {offset}")]
    UnknownOpcode {
        /// The gene containing the bad opcode
        gene_id: usize,
        /// The unrecognized opcode byte
        opcode: u8,
        /// Byte offset of the opcode
        offset: usize,
    },

    /// A referenced gene ID does not exist in the compiled genome
    #[error("gene {0} does not exist")]
    UnknownGene(usize),

    /// Gene execution exceeded the bounded iteration count for a loop, or nested too deep
    #[error("gene {gene_id} exceeded its execution bound: {reason}")]
    ExecutionBoundExceeded {
        /// The gene that ran away
        gene_id: usize,
        /// What bound was hit
        reason: String,
    },
}
