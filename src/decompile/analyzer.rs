//! Variable & function analyzer (§4.6): classifies every referenced data
//! address and partitions decoded instructions into functions.
//!
//! Grounded on the hardware-register address ranges already documented in
//! the teacher's `cpu/mod.rs` status-flag comment block and
//! `ShlomiRex-rust-nes-emulator/src/mmu.rs`'s PPU/APU register windows; the
//! register names themselves are the standard NESdev mnemonics.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::cpu::disassembler::DisassembledInstruction;
use crate::cpu::{AddressingMode, InstructionCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    Byte,
    Word,
    Array,
    Pointer,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub address: u16,
    pub name: String,
    pub var_type: VariableType,
    pub size: usize,
    pub is_read: bool,
    pub is_written: bool,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub entry_address: u16,
    pub name: String,
    pub instruction_addresses: HashSet<u16>,
    pub variables_accessed: HashSet<u16>,
    pub called_functions: HashSet<u16>,
}

/// The canonical PPU register block, `0x2000..=0x2007`.
fn ppu_register_name(address: u16) -> Option<&'static str> {
    match address {
        0x2000 => Some("PPUCTRL"),
        0x2001 => Some("PPUMASK"),
        0x2002 => Some("PPUSTATUS"),
        0x2003 => Some("OAMADDR"),
        0x2004 => Some("OAMDATA"),
        0x2005 => Some("PPUSCROLL"),
        0x2006 => Some("PPUADDR"),
        0x2007 => Some("PPUDATA"),
        _ => None,
    }
}

/// The canonical APU/controller register block, `0x4000..=0x4017`.
fn apu_register_name(address: u16) -> Option<&'static str> {
    match address {
        0x4000 => Some("SQ1_VOL"),
        0x4001 => Some("SQ1_SWEEP"),
        0x4002 => Some("SQ1_LO"),
        0x4003 => Some("SQ1_HI"),
        0x4004 => Some("SQ2_VOL"),
        0x4005 => Some("SQ2_SWEEP"),
        0x4006 => Some("SQ2_LO"),
        0x4007 => Some("SQ2_HI"),
        0x4008 => Some("TRI_LINEAR"),
        0x400A => Some("TRI_LO"),
        0x400B => Some("TRI_HI"),
        0x400C => Some("NOISE_VOL"),
        0x400E => Some("NOISE_LO"),
        0x400F => Some("NOISE_HI"),
        0x4010 => Some("DMC_FREQ"),
        0x4011 => Some("DMC_RAW"),
        0x4012 => Some("DMC_START"),
        0x4013 => Some("DMC_LEN"),
        0x4014 => Some("OAMDMA"),
        0x4015 => Some("SND_CHN"),
        0x4016 => Some("JOY1"),
        0x4017 => Some("JOY2"),
        _ => None,
    }
}

pub(crate) fn hardware_register_name(address: u16) -> Option<&'static str> {
    if (0x2000..=0x2007).contains(&address) {
        ppu_register_name(address)
    } else if (0x4000..=0x4017).contains(&address) {
        apu_register_name(address)
    } else {
        None
    }
}

fn fallback_name(address: u16) -> String {
    if address < 0x0100 {
        format!("zp_{:02X}", address)
    } else if address < 0x0800 {
        format!("ram_{:04X}", address)
    } else if address >= 0x8000 {
        format!("rom_{:04X}", address)
    } else {
        format!("var_{:04X}", address)
    }
}

pub(crate) fn memory_operand_address(instr: &DisassembledInstruction) -> Option<u16> {
    if !instr.info.addressing_mode.has_memory_operand() {
        return None;
    }
    match instr.info.addressing_mode {
        AddressingMode::ZeroPage | AddressingMode::ZeroPageX | AddressingMode::ZeroPageY => {
            Some(instr.bytes[0] as u16)
        }
        AddressingMode::IndexedIndirect | AddressingMode::IndirectIndexed => Some(instr.bytes[0] as u16),
        AddressingMode::Absolute | AddressingMode::AbsoluteX | AddressingMode::AbsoluteY => {
            Some(u16::from_le_bytes([instr.bytes[1], instr.bytes[2]]))
        }
        // Indirect (JMP) has no data operand: its operand is a code address.
        AddressingMode::Indirect => None,
        _ => None,
    }
}

/// Classify every memory-referencing instruction into its `Variable` (§4.6,
/// first half). `instructions` is the full decoded set, independent of
/// function boundaries.
pub fn analyze_variables(instructions: &HashMap<u16, DisassembledInstruction>) -> HashMap<u16, Variable> {
    let mut variables: HashMap<u16, Variable> = HashMap::new();

    for instr in instructions.values() {
        if instr.info.category == InstructionCategory::Jump || instr.info.category == InstructionCategory::Branch {
            continue;
        }
        let Some(address) = memory_operand_address(instr) else {
            continue;
        };

        let mode = instr.info.addressing_mode;
        let entry = variables.entry(address).or_insert_with(|| Variable {
            address,
            name: hardware_register_name(address)
                .map(str::to_string)
                .unwrap_or_else(|| fallback_name(address)),
            var_type: VariableType::Byte,
            size: 1,
            is_read: false,
            is_written: false,
        });

        if mode.is_indirect_pointer() && entry.var_type != VariableType::Pointer {
            entry.var_type = VariableType::Pointer;
        } else if mode.is_indexed() && entry.var_type != VariableType::Pointer {
            entry.var_type = VariableType::Array;
            entry.size = 256;
        }

        if instr.info.category == InstructionCategory::Store {
            entry.is_written = true;
        } else {
            entry.is_read = true;
        }
    }

    variables
}

fn end_of_function(mnemonic: &str, mode: AddressingMode) -> bool {
    matches!(mnemonic, "JSR" | "BRK" | "RTI" | "RTS") || mode == AddressingMode::Indirect
}

/// Local reachability BFS for one function, same termination rules as §4.5
/// but collecting only `instruction_addresses`/`variables_accessed`/
/// `called_functions` rather than an ordered emission listing.
fn trace_function_body(
    entry_address: u16,
    instructions: &HashMap<u16, DisassembledInstruction>,
) -> (HashSet<u16>, HashSet<u16>, HashSet<u16>) {
    let mut visited = HashSet::new();
    let mut variables_accessed = HashSet::new();
    let mut called_functions = HashSet::new();
    let mut worklist = VecDeque::from([entry_address]);

    while let Some(address) = worklist.pop_front() {
        if visited.contains(&address) {
            continue;
        }
        let Some(instr) = instructions.get(&address) else {
            continue;
        };
        visited.insert(address);

        if let Some(var_address) = memory_operand_address(instr) {
            variables_accessed.insert(var_address);
        }

        let is_end = end_of_function(instr.info.mnemonic, instr.info.addressing_mode);
        if instr.info.mnemonic == "JSR" {
            if let Some(target) = instr.target_address {
                called_functions.insert(target);
            }
        }
        if !is_end {
            if let Some(target) = instr.target_address {
                worklist.push_back(target);
            }
            if instr.info.mnemonic != "JMP" && instr.info.mnemonic != "JSR" {
                worklist.push_back(address.wrapping_add(instr.info.size as u16));
            }
        }
    }

    (visited, variables_accessed, called_functions)
}

/// Partition decoded instructions into functions (§4.6, second half), seeded
/// from `seed_entry_points` (reset vector, NMI/IRQ if present, every `JSR`
/// target discovered by the disassembler).
pub fn analyze_functions(
    instructions: &HashMap<u16, DisassembledInstruction>,
    seed_entry_points: &HashSet<u16>,
) -> HashMap<u16, Function> {
    seed_entry_points
        .iter()
        .filter(|addr| instructions.contains_key(addr))
        .map(|&entry_address| {
            let (instruction_addresses, variables_accessed, called_functions) =
                trace_function_body(entry_address, instructions);
            (
                entry_address,
                Function {
                    entry_address,
                    name: format!("sub_{:04X}", entry_address),
                    instruction_addresses,
                    variables_accessed,
                    called_functions,
                },
            )
        })
        .collect()
}
