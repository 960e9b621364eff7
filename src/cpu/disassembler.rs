//! Whole-PRG disassembler: linear sweep + recursive trace + labeling +
//! fixed-point re-sweep (§4.4).
//!
//! Grounded on the teacher's `cpu/disassembler.rs`, whose `while pc <
//! prg_size` loop is the same linear-sweep shape used here in
//! [`linear_sweep_region`] — generalized from printing each instruction to
//! populating a returned `cpu_address -> DisassembledInstruction` map, swept
//! per [`crate::region::CodeRegion`] so a mirrored bank's two windows key
//! their instructions independently, and extended with the recursive-trace
//! worklist the teacher never had.

use std::collections::{HashMap, HashSet, VecDeque};

use super::instructions::{self, InstructionInfo};
use super::{AddressingMode, InstructionCategory};
use crate::region::{find_region, regions_for_rom, CodeRegion};
use crate::rom::{ROMImage, PRG_BASE};

/// One decoded instruction at a specific CPU address (§3).
#[derive(Debug, Clone)]
pub struct DisassembledInstruction {
    pub cpu_address: u16,
    pub rom_offset: u16,
    pub info: &'static InstructionInfo,
    pub bytes: Vec<u8>,
    pub target_address: Option<u16>,
    pub label: Option<String>,
    pub comment: Option<String>,
    /// Tie-breaker for multiple synthetic records at the same
    /// `cpu_address`: 0 for real instructions, positive for loopback-repair
    /// pseudo-JMPs, negative for virtual variants (§3).
    pub sub_address_order: i32,
}

impl DisassembledInstruction {
    pub fn is_branch(&self) -> bool {
        self.info.category == InstructionCategory::Branch
    }

    pub fn is_jump(&self) -> bool {
        matches!(self.info.mnemonic, "JMP" | "JSR")
    }

    pub fn is_function_exit(&self) -> bool {
        matches!(self.info.mnemonic, "RTS" | "RTI")
    }
}

/// Resolve `target_address` per §4.3.
pub fn resolve_target(cpu_address: u16, info: &InstructionInfo, bytes: &[u8]) -> Option<u16> {
    match info.addressing_mode {
        AddressingMode::Relative => {
            let displacement = bytes[1] as i8 as i16 as u16;
            Some(cpu_address.wrapping_add(info.size as u16).wrapping_add(displacement))
        }
        AddressingMode::Absolute if matches!(info.mnemonic, "JMP" | "JSR") => {
            Some(u16::from_le_bytes([bytes[1], bytes[2]]))
        }
        // JMP (indirect): the indirection base, not the runtime target.
        AddressingMode::Indirect if info.mnemonic == "JMP" => Some(u16::from_le_bytes([bytes[1], bytes[2]])),
        _ => None,
    }
}

fn decode_one(prg: &[u8], offset: usize, cpu_address: u16) -> Option<DisassembledInstruction> {
    let opcode = *prg.get(offset)?;
    let info = instructions::lookup(opcode);
    if !info.is_valid {
        return None;
    }
    let size = info.size as usize;
    if offset + size > prg.len() {
        return None;
    }
    let bytes = prg[offset..offset + size].to_vec();
    let target_address = resolve_target(cpu_address, info, &bytes);
    Some(DisassembledInstruction {
        cpu_address,
        rom_offset: offset as u16,
        info,
        bytes,
        target_address,
        label: None,
        comment: None,
        sub_address_order: 0,
    })
}

/// Phase A: linear sweep of one [`CodeRegion`], starting at the PRG offset
/// `start_offset` within that region and keying every decoded instruction by
/// that region's own base address. A 16KiB bank mirrors into two regions
/// sharing the same underlying bytes but different base addresses (`0x8000`
/// and `0xC000`), so a reference into either window must be swept — and
/// keyed — against the region it actually falls in, not unconditionally
/// against `PRG_BASE`. Stops when an already-decoded address is reached or
/// the region ends; invalid opcodes are skipped one byte at a time, silently.
fn linear_sweep_region(region: &CodeRegion<'_>, start_offset: usize, instructions: &mut HashMap<u16, DisassembledInstruction>) {
    let mut offset = start_offset;
    while offset < region.bytes.len() {
        let cpu_address = region.base_address.wrapping_add(offset as u16);
        if instructions.contains_key(&cpu_address) {
            break;
        }
        match decode_one(region.bytes, offset, cpu_address) {
            Some(instr) => {
                let size = instr.info.size as usize;
                instructions.insert(cpu_address, instr);
                offset += size;
            }
            None => offset += 1,
        }
    }
}

/// Phase B: worklist trace from `entry_points` (which may grow as `JSR`
/// targets are discovered). Returns every address encountered as a
/// resolved target.
fn trace(instructions: &HashMap<u16, DisassembledInstruction>, entry_points: &mut HashSet<u16>) -> HashSet<u16> {
    let mut referenced = HashSet::new();
    let mut traced = HashSet::new();
    let mut worklist: VecDeque<u16> = entry_points.iter().copied().collect();

    while let Some(address) = worklist.pop_front() {
        if traced.contains(&address) {
            continue;
        }
        let Some(instr) = instructions.get(&address) else {
            // Not yet decoded (likely inside data skipped by the linear
            // sweep); Phase D will re-sweep and a later trace call over the
            // same control-flow graph will naturally revisit this address.
            continue;
        };
        traced.insert(address);
        let size = instr.info.size as u16;

        if instr.info.mnemonic == "JSR" {
            if let Some(target) = instr.target_address {
                referenced.insert(target);
                entry_points.insert(target);
                worklist.push_back(target);
            }
            worklist.push_back(address.wrapping_add(size));
        } else if instr.info.mnemonic == "JMP" && instr.info.addressing_mode == AddressingMode::Absolute {
            if let Some(target) = instr.target_address {
                referenced.insert(target);
                worklist.push_back(target);
            }
        } else if instr.is_branch() {
            if let Some(target) = instr.target_address {
                referenced.insert(target);
                worklist.push_back(target);
            }
            worklist.push_back(address.wrapping_add(size));
        } else if instr.is_function_exit() {
            // stop this path
        } else {
            worklist.push_back(address.wrapping_add(size));
        }
    }

    referenced
}

/// Hard cap on Phase D re-sweep iterations (§4.4, §5).
pub const MAX_RESWEEP_ITERATIONS: u32 = 100;

/// Result of a whole-PRG disassembly pass (§6).
#[derive(Debug, Clone)]
pub struct DisassemblyReport {
    pub instructions: HashMap<u16, DisassembledInstruction>,
    pub labels: HashMap<u16, String>,
    pub entry_points: HashSet<u16>,
    pub referenced_addresses: HashSet<u16>,
    /// Set when Phase D hit [`MAX_RESWEEP_ITERATIONS`] before converging
    /// (§7 `Saturated`); the report still contains whatever was decided.
    pub saturated: bool,
}

/// Disassemble the whole PRG bank per §4.4.
pub fn disassemble(rom: &ROMImage) -> DisassemblyReport {
    let regions = regions_for_rom(rom);
    let mut instructions = HashMap::new();
    let mut entry_points = rom.entry_points.clone();

    for region in &regions {
        linear_sweep_region(region, 0, &mut instructions);
    }

    let mut referenced = HashSet::new();
    let mut saturated = false;
    let mut iteration = 0u32;
    loop {
        referenced.extend(trace(&instructions, &mut entry_points));

        let missing: Vec<u16> = referenced
            .iter()
            .copied()
            .filter(|a| *a >= PRG_BASE && !instructions.contains_key(a))
            .collect();
        if missing.is_empty() {
            break;
        }

        iteration += 1;
        if iteration > MAX_RESWEEP_ITERATIONS {
            log::warn!(
                "disassembly re-sweep saturated after {} iterations with {} references unresolved",
                MAX_RESWEEP_ITERATIONS,
                missing.len()
            );
            saturated = true;
            break;
        }

        for address in missing {
            if let Some(region) = find_region(&regions, address) {
                if let Some(offset) = region.offset_of(address) {
                    linear_sweep_region(region, offset, &mut instructions);
                }
            }
        }
    }

    // Phase C: label assignment.
    let mut labels = HashMap::new();
    for &address in &entry_points {
        labels.insert(address, format!("sub_{:04X}", address));
    }
    for &address in &referenced {
        if !entry_points.contains(&address) {
            labels.entry(address).or_insert_with(|| format!("loc_{:04X}", address));
        }
    }
    for instr in instructions.values_mut() {
        if let Some(label) = labels.get(&instr.cpu_address) {
            instr.label = Some(label.clone());
        }
        if let Some(target) = instr.target_address {
            if let Some(label) = labels.get(&target) {
                instr.comment = Some(format!("-> {}", label));
            }
        }
    }

    log::debug!(
        "disassembled {} instructions, {} entry points, {} labels",
        instructions.len(),
        entry_points.len(),
        labels.len()
    );

    DisassemblyReport {
        instructions,
        labels,
        entry_points,
        referenced_addresses: referenced,
        saturated,
    }
}
