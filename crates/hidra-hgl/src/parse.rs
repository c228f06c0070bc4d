//! Genome text parsing and gene bytecode decoding.

use crate::ast::{CompiledGenome, GeneNode, GeneOp, GeneOperand, SignalKind};
use crate::error::{HglError, Result};

/// A raw, uncompiled genome: one hex byte slice per gene, in positional order.
#[derive(Debug, Clone, Default)]
pub struct Genome {
    /// Raw gene bytes, gene-ID order.
    pub genes: Vec<Vec<u8>>,
}

/// Parse a genome text document into raw gene byte slices.
///
/// The format is uppercase hex bytes with the literal two-character
/// delimiter `"GN"` separating genes. `G` and `N` do not appear in the hex
/// alphabet, so splitting on the literal delimiter first is unambiguous.
/// Non-hex characters (whitespace, comments) within a gene segment are
/// stripped; a dangling half-byte at the end of a gene is zero-padded.
pub fn parse_genome_text(text: &str) -> Result<Genome> {
    let upper = text.to_ascii_uppercase();
    let mut genes = Vec::new();
    for segment in upper.split("GN") {
        let hex: String = segment.chars().filter(|c| c.is_ascii_hexdigit()).collect();
        if hex.is_empty() {
            genes.push(Vec::new());
            continue;
        }
        let mut padded = hex;
        if padded.len() % 2 != 0 {
            padded.push('0');
        }
        let bytes = (0..padded.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&padded[i..i + 2], 16).unwrap_or(0))
            .collect();
        genes.push(bytes);
    }
    if genes.is_empty() || genes[0].is_empty() {
        return Err(HglError::MissingGenesis);
    }
    Ok(Genome { genes })
}

/// Compile every gene's raw bytes into a [`GeneNode`] tree.
pub fn compile_genome(genome: &Genome) -> Result<CompiledGenome> {
    let mut genes = Vec::with_capacity(genome.genes.len());
    for (gene_id, bytes) in genome.genes.iter().enumerate() {
        genes.push(decode_gene(gene_id, bytes)?);
    }
    Ok(CompiledGenome { genes })
}

struct Cursor<'a> {
    gene_id: usize,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take_u8(&mut self) -> Result<u8> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(HglError::Truncated {
                gene_id: self.gene_id,
                offset: self.pos,
            })?;
        self.pos += 1;
        Ok(b)
    }

    fn take_f32(&mut self) -> Result<f32> {
        let offset = self.pos;
        let mut buf = [0u8; 4];
        for slot in buf.iter_mut() {
            *slot = self.take_u8()?;
        }
        let _ = offset;
        Ok(f32::from_le_bytes(buf))
    }

    fn take_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        for slot in buf.iter_mut() {
            *slot = self.take_u8()?;
        }
        Ok(u32::from_le_bytes(buf))
    }

    fn decode_children(&mut self, count: usize) -> Result<Vec<GeneNode>> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.decode_node()?);
        }
        Ok(out)
    }

    fn decode_node(&mut self) -> Result<GeneNode> {
        let opcode_offset = self.pos;
        let opcode = self.take_u8()?;
        match opcode {
            0x00 => Ok(GeneNode::new(GeneOp::Nop, GeneOperand::None, vec![])),
            0x01 => {
                let v = self.take_f32()?;
                Ok(GeneNode::new(GeneOp::Const, GeneOperand::Const(v), vec![]))
            }
            0x02 => {
                let idx = self.take_u8()?;
                Ok(GeneNode::new(GeneOp::SelfLVar, GeneOperand::Index(idx), vec![]))
            }
            0x03 => {
                let idx = self.take_u8()?;
                Ok(GeneNode::new(GeneOp::Hormone, GeneOperand::Index(idx), vec![]))
            }
            0x04 => Ok(GeneNode::new(GeneOp::Random, GeneOperand::None, vec![])),
            0x10 => Ok(GeneNode::new(GeneOp::Add, GeneOperand::None, self.decode_children(2)?)),
            0x11 => Ok(GeneNode::new(GeneOp::Sub, GeneOperand::None, self.decode_children(2)?)),
            0x12 => Ok(GeneNode::new(GeneOp::Mul, GeneOperand::None, self.decode_children(2)?)),
            0x13 => Ok(GeneNode::new(GeneOp::Div, GeneOperand::None, self.decode_children(2)?)),
            0x14 => Ok(GeneNode::new(GeneOp::Gt, GeneOperand::None, self.decode_children(2)?)),
            0x15 => Ok(GeneNode::new(GeneOp::Lt, GeneOperand::None, self.decode_children(2)?)),
            0x16 => Ok(GeneNode::new(GeneOp::Eq, GeneOperand::None, self.decode_children(2)?)),
            0x17 => Ok(GeneNode::new(GeneOp::And, GeneOperand::None, self.decode_children(2)?)),
            0x18 => Ok(GeneNode::new(GeneOp::Or, GeneOperand::None, self.decode_children(2)?)),
            0x19 => Ok(GeneNode::new(GeneOp::Not, GeneOperand::None, self.decode_children(1)?)),
            0x20 => {
                let count = self.take_u8()? as usize;
                Ok(GeneNode::new(GeneOp::Seq, GeneOperand::None, self.decode_children(count)?))
            }
            0x21 => Ok(GeneNode::new(GeneOp::If, GeneOperand::None, self.decode_children(2)?)),
            0x22 => {
                let bound = self.take_u32()?;
                let body = self.decode_node()?;
                Ok(GeneNode::new_loop(bound, body))
            }
            0x23 => Ok(GeneNode::new(GeneOp::Break, GeneOperand::None, vec![])),
            0x30 => {
                let idx = self.take_u8()?;
                Ok(GeneNode::new(
                    GeneOp::SetLVar,
                    GeneOperand::Index(idx),
                    self.decode_children(1)?,
                ))
            }
            0x31 => {
                let idx = self.take_u8()?;
                Ok(GeneNode::new(
                    GeneOp::SetHormone,
                    GeneOperand::Index(idx),
                    self.decode_children(1)?,
                ))
            }
            0x32 => Ok(GeneNode::new(GeneOp::AddNeuron, GeneOperand::None, self.decode_children(3)?)),
            0x33 => {
                let tag = self.take_u8()?;
                let signal = SignalKind::from_tag(tag).ok_or(HglError::UnknownOpcode {
                    gene_id: self.gene_id,
                    opcode: tag,
                    offset: opcode_offset + 1,
                })?;
                Ok(GeneNode::new(
                    GeneOp::AddSynapse,
                    GeneOperand::Signal(signal),
                    self.decode_children(4)?,
                ))
            }
            0x34 => Ok(GeneNode::new(
                GeneOp::RemoveSynapse,
                GeneOperand::None,
                self.decode_children(1)?,
            )),
            0x35 => Ok(GeneNode::new(
                GeneOp::EnqueueMitosis,
                GeneOperand::None,
                self.decode_children(3)?,
            )),
            0x36 => Ok(GeneNode::new(GeneOp::EnqueueApoptosis, GeneOperand::None, vec![])),
            other => Err(HglError::UnknownOpcode {
                gene_id: self.gene_id,
                opcode: other,
                offset: opcode_offset,
            }),
        }
    }
}

fn decode_gene(gene_id: usize, bytes: &[u8]) -> Result<GeneNode> {
    if bytes.is_empty() {
        return Ok(GeneNode::new(GeneOp::Nop, GeneOperand::None, vec![]));
    }
    let mut cursor = Cursor {
        gene_id,
        bytes,
        pos: 0,
    };
    cursor.decode_node()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_literal_delimiter() {
        let genome = parse_genome_text("00GN01").expect("parse");
        assert_eq!(genome.genes.len(), 2);
        assert_eq!(genome.genes[0], vec![0x00]);
        assert_eq!(genome.genes[1], vec![0x01]);
    }

    #[test]
    fn strips_whitespace_and_pads_half_byte() {
        let genome = parse_genome_text("0 0 1\n").expect("parse");
        // "001" -> strip whitespace -> "001" -> odd length -> pad -> "0010"
        assert_eq!(genome.genes[0], vec![0x00, 0x10]);
    }

    #[test]
    fn missing_gene_zero_is_fatal() {
        let result = parse_genome_text("");
        assert!(matches!(result, Err(HglError::MissingGenesis)));
        let result = parse_genome_text("GN01");
        assert!(matches!(result, Err(HglError::MissingGenesis)));
    }

    #[test]
    fn decodes_nop_gene() {
        let genome = Genome {
            genes: vec![vec![0x00]],
        };
        let compiled = compile_genome(&genome).expect("compile");
        assert_eq!(compiled.gene(0).unwrap().op, GeneOp::Nop);
    }

    #[test]
    fn decodes_arithmetic_tree() {
        // Add(Const(2.0), Const(3.0))
        let mut bytes = vec![0x10];
        bytes.push(0x01);
        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        bytes.push(0x01);
        bytes.extend_from_slice(&3.0f32.to_le_bytes());
        let genome = Genome { genes: vec![bytes] };
        let compiled = compile_genome(&genome).expect("compile");
        let root = compiled.gene(0).unwrap();
        assert_eq!(root.op, GeneOp::Add);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].operand, GeneOperand::Const(2.0));
        assert_eq!(root.children[1].operand, GeneOperand::Const(3.0));
    }

    #[test]
    fn truncated_gene_is_an_error() {
        let genome = Genome {
            genes: vec![vec![0x01, 0x00, 0x00]], // Const needs 4 operand bytes, only 2 given
        };
        let result = compile_genome(&genome);
        assert!(matches!(result, Err(HglError::Truncated { gene_id: 0, .. })));
    }

    #[test]
    fn unknown_opcode_is_an_error() {
        let genome = Genome {
            genes: vec![vec![0xEE]],
        };
        let result = compile_genome(&genome);
        assert!(matches!(
            result,
            Err(HglError::UnknownOpcode { gene_id: 0, opcode: 0xEE, .. })
        ));
    }
}
