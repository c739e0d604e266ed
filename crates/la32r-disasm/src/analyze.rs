use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;

use la32r_rs::decoder::Decoder;
use la32r_rs::disasm::fmt_decoded;
use la32r_rs::instructions::Effects;
use la32r_rs::isa::la32r::La32rDecoder;

use crate::model::{is_mapped, read_u32, Image};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeKind {
    #[serde(rename = "ft")]
    Fallthrough,
    #[serde(rename = "br")]
    Branch,
    #[serde(rename = "cbr")]
    CondBranch,
    #[serde(rename = "call")]
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: u32,
    pub to: u32,
    pub kind: EdgeKind,
}

#[derive(Debug, Default)]
pub struct Analysis {
    /// pc -> instruction word, for every reached instruction
    pub insns: BTreeMap<u32, u32>,
    pub edges: Vec<Edge>,
    /// break and undecodable words
    pub halts: BTreeSet<u32>,
    /// jirl, whose target is only known at run time
    pub indirect: BTreeSet<u32>,
    /// loads and stores
    pub mem_access: BTreeSet<u32>,
}

fn link(out: &mut Analysis, queue: &mut VecDeque<u32>, img: &Image, edge: Edge) {
    out.edges.push(edge);
    if is_mapped(img, edge.to) && !out.insns.contains_key(&edge.to) {
        queue.push_back(edge.to);
    }
}

/// Follows static control flow from `entries`, decoding at most `max_instr`
/// instructions.
pub fn analyze_entries(img: &Image, entries: &[u32], max_instr: usize) -> Analysis {
    let dec = La32rDecoder::new();
    let mut out = Analysis::default();
    let mut queue: VecDeque<u32> = entries.iter().copied().filter(|&e| is_mapped(img, e)).collect();

    while let Some(pc) = queue.pop_front() {
        if out.insns.len() >= max_instr {
            break;
        }
        if out.insns.contains_key(&pc) {
            continue;
        }
        let Some(raw) = read_u32(img, pc) else { continue };
        out.insns.insert(pc, raw);

        let fx = dec.lookup(raw).effects;
        let d = dec.decode(raw);
        let ft = Edge { from: pc, to: pc.wrapping_add(4), kind: EdgeKind::Fallthrough };
        let tgt = pc.wrapping_add(d.imm << 2);

        if fx.intersects(Effects::LOAD | Effects::STORE) {
            out.mem_access.insert(pc);
        }
        if fx.contains(Effects::HALT) {
            out.halts.insert(pc);
        } else if fx.contains(Effects::INDIRECT) {
            out.indirect.insert(pc);
            // a linking jirl is a call and comes back
            if d.rd != 0 {
                link(&mut out, &mut queue, img, ft);
            }
        } else if fx.contains(Effects::CALL) {
            link(&mut out, &mut queue, img, Edge { from: pc, to: tgt, kind: EdgeKind::Call });
            link(&mut out, &mut queue, img, ft);
        } else if fx.contains(Effects::JUMP) {
            link(&mut out, &mut queue, img, Edge { from: pc, to: tgt, kind: EdgeKind::Branch });
        } else if fx.contains(Effects::BRANCH) {
            link(&mut out, &mut queue, img, Edge { from: pc, to: tgt, kind: EdgeKind::CondBranch });
            link(&mut out, &mut queue, img, ft);
        } else {
            link(&mut out, &mut queue, img, ft);
        }
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub start: u32,
    /// exclusive
    pub end: u32,
    pub insns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub entries: Vec<u32>,
    pub blocks: Vec<Block>,
    pub edges: Vec<Edge>,
    pub halts: Vec<u32>,
    pub indirect: Vec<u32>,
    pub mem_access: Vec<u32>,
}

impl Analysis {
    /// Splits the reached instructions into straight-line blocks.
    pub fn blocks(&self, entries: &[u32]) -> Vec<Block> {
        let dec = La32rDecoder::new();
        let mut starts: BTreeSet<u32> = entries.iter().copied().collect();
        let mut enders: BTreeSet<u32> = self.halts.union(&self.indirect).copied().collect();
        for e in &self.edges {
            if e.kind != EdgeKind::Fallthrough {
                starts.insert(e.to);
                enders.insert(e.from);
            }
        }

        let mut blocks: Vec<Block> = Vec::new();
        let mut open = false;
        for (&pc, &raw) in &self.insns {
            let contiguous = blocks.last().is_some_and(|b| b.end == pc);
            if !open || starts.contains(&pc) || !contiguous {
                blocks.push(Block { start: pc, end: pc, insns: Vec::new() });
            }
            if let Some(b) = blocks.last_mut() {
                b.end = pc.wrapping_add(4);
                b.insns.push(fmt_decoded(&dec.decode(raw), pc));
            }
            open = !enders.contains(&pc);
        }
        blocks
    }

    pub fn report(&self, entries: &[u32]) -> Report {
        Report {
            entries: entries.to_vec(),
            blocks: self.blocks(entries),
            edges: self.edges.clone(),
            halts: self.halts.iter().copied().collect(),
            indirect: self.indirect.iter().copied().collect(),
            mem_access: self.mem_access.iter().copied().collect(),
        }
    }
}
