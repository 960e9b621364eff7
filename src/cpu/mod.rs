pub mod disassembler;
pub mod instructions;

use std::fmt;

// Ref: https://wiki.nesdev.com/w/index.php/CPU_status_flag_behavior
// 7  bit  0
// ---- ----
// NVUB DIZC
// |||| ||||
// |||| |||+- Carry
// |||| ||+-- Zero
// |||| |+--- Interrupt disable
// |||| +---- Decimal (present on the die, not wired up on the NES's 2A03)
// |||+------ Break
// ||+------- Unused, always reads 1
// |+-------- Overflow
// +--------- Negative
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        const CARRY     = 0x01;
        const ZERO      = 0x02;
        const INTERRUPT = 0x04;
        const DECIMAL   = 0x08;
        const BREAK     = 0x10;
        const UNUSED    = 0x20;
        const OVERFLOW  = 0x40;
        const NEGATIVE  = 0x80;
    }
}

/// The thirteen 6502 addressing modes.
/// Ref: http://www.thealmightyguru.com/Games/Hacking/Wiki/index.php?title=Addressing_Modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect,
    IndirectIndexed,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode byte.
    pub fn operand_len(self) -> usize {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::Relative
            | AddressingMode::IndexedIndirect
            | AddressingMode::IndirectIndexed => 1,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
        }
    }

    /// §4.6: modes with no memory operand to analyze at all.
    pub fn has_memory_operand(self) -> bool {
        !matches!(
            self,
            AddressingMode::Implied
                | AddressingMode::Accumulator
                | AddressingMode::Immediate
                | AddressingMode::Relative
        )
    }

    /// §4.6: indexed modes trigger the `Array` upgrade.
    pub fn is_indexed(self) -> bool {
        matches!(
            self,
            AddressingMode::ZeroPageX
                | AddressingMode::ZeroPageY
                | AddressingMode::AbsoluteX
                | AddressingMode::AbsoluteY
        )
    }

    /// §4.6: indirect modes trigger the `Pointer` upgrade.
    pub fn is_indirect_pointer(self) -> bool {
        matches!(self, AddressingMode::IndexedIndirect | AddressingMode::IndirectIndexed)
    }

    /// Render the operand text per §4.2. `resolved_target` supplies the
    /// post-resolution address for `Relative` operands.
    pub fn format_operand(self, bytes: &[u8], resolved_target: Option<u16>) -> String {
        match self {
            AddressingMode::Implied => String::new(),
            AddressingMode::Accumulator => "A".to_string(),
            AddressingMode::Immediate => format!("#${:02X}", bytes[0]),
            AddressingMode::ZeroPage => format!("${:02X}", bytes[0]),
            AddressingMode::ZeroPageX => format!("${:02X},X", bytes[0]),
            AddressingMode::ZeroPageY => format!("${:02X},Y", bytes[0]),
            AddressingMode::Relative => format!("${:04X}", resolved_target.unwrap_or(0)),
            AddressingMode::Absolute => format!("${:04X}", le_word(bytes)),
            AddressingMode::AbsoluteX => format!("${:04X},X", le_word(bytes)),
            AddressingMode::AbsoluteY => format!("${:04X},Y", le_word(bytes)),
            AddressingMode::Indirect => format!("(${:04X})", le_word(bytes)),
            AddressingMode::IndexedIndirect => format!("(${:02X},X)", bytes[0]),
            AddressingMode::IndirectIndexed => format!("(${:02X}),Y", bytes[0]),
        }
    }
}

fn le_word(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Broad functional category, used for dispatch in the C emitter and for
/// the disassembler's branch/jump/exit predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionCategory {
    Load,
    Store,
    Transfer,
    Stack,
    Arithmetic,
    Increment,
    Decrement,
    Shift,
    Logic,
    Compare,
    Branch,
    Jump,
    Return,
    SetFlag,
    ClearFlag,
    Interrupt,
    Other,
}
