//! Assembly listing emitter: a textual rendering of a `DisassemblyReport`.
//!
//! Grounded on `romatthe-mudkip/src/cpu/disassembler.rs`'s
//! `Display for InstructionDeNovo`, which formats one instruction as
//! `mnemonic operand`; generalized here to a whole-report sink that also
//! prints labels and `-> target` comments.

use std::fmt::Write as _;

use crate::cpu::disassembler::DisassemblyReport;

/// Render a full disassembly as an assembly-style listing, one instruction
/// per line, in ascending address order.
pub fn emit_asm(report: &DisassemblyReport) -> String {
    let mut addresses: Vec<u16> = report.instructions.keys().copied().collect();
    addresses.sort_unstable();

    let mut out = String::new();
    for address in addresses {
        let instr = &report.instructions[&address];
        if let Some(label) = &instr.label {
            let _ = writeln!(out, "{}:", label);
        }
        let operand = instr.info.addressing_mode.format_operand(&instr.bytes[1..], instr.target_address);
        let _ = write!(out, "    ${:04X}  {:<4}", address, instr.info.mnemonic);
        if !operand.is_empty() {
            let _ = write!(out, " {}", operand);
        }
        if let Some(comment) = &instr.comment {
            let _ = write!(out, "  ; {}", comment);
        }
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::disassembler::disassemble;
    use crate::rom;
    use byteorder::{ByteOrder, LittleEndian};

    #[test]
    fn listing_includes_label_and_target_comment() {
        let mut prg = vec![0xA9, 0x01, 0xD0, 0x02, 0xA9, 0x02, 0x00];
        prg.resize(rom::PRG_ROM_PAGE_LENGTH, 0xEA);
        let len = prg.len();
        LittleEndian::write_u16(&mut prg[len - 6..len - 4], 0x8000);
        LittleEndian::write_u16(&mut prg[len - 4..len - 2], 0x8000);
        LittleEndian::write_u16(&mut prg[len - 2..], 0x8000);

        let mut bytes = vec![0u8; rom::HEADER_LENGTH];
        bytes[0..4].copy_from_slice(b"NES\x1a");
        bytes[4] = 1;
        bytes.extend(prg);
        let image = rom::load(&bytes).unwrap();
        let report = disassemble(&image);
        let listing = emit_asm(&report);

        assert!(listing.contains("sub_8000:"));
        assert!(listing.contains("BNE"));
        assert!(listing.contains("; -> loc_8006"));
    }
}
