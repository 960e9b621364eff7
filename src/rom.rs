//! iNES container parsing (§4.1).
//!
//! Grounded on the teacher's `nes/rom.rs`: same `bitflags!` treatment of
//! flags6/flags7 and the same `nom`-combinator header parse, upgraded from
//! `nom` 3's `IResult::Done` style to 7's `Result`-returning combinators.
//! The mapper-id formula is corrected to the spec's
//! `(flags7 & 0xF0) | (flags6 >> 4)` (the teacher's `(flags7 << 4) | flags6`
//! does not match the iNES spec).

use std::collections::HashSet;

use byteorder::{ByteOrder, LittleEndian};
use nom::bytes::complete::{tag, take};
use nom::combinator::cond;
use nom::number::complete::u8 as nom_u8;
use nom::sequence::tuple;
use nom::IResult;

use crate::error::AnalyzerError;

pub const TRAINER_LENGTH: usize = 512;
pub const PRG_ROM_PAGE_LENGTH: usize = 16384;
pub const CHR_ROM_PAGE_LENGTH: usize = 8192;
pub const HEADER_LENGTH: usize = 16;

/// PRG ROM is mapped into CPU space starting here (§ GLOSSARY: PRG ROM).
pub const PRG_BASE: u16 = 0x8000;

bitflags::bitflags! {
    /// Ref: https://wiki.nesdev.com/w/index.php/INES#Flags_6
    struct Flags6: u8 {
        const VERTICAL     = 0b0000_0001;
        const BATTERY      = 0b0000_0010;
        const TRAINER      = 0b0000_0100;
        const FOUR_SCREEN  = 0b0000_1000;
        const MAPPER_LOW   = 0b1111_0000;
    }
}

bitflags::bitflags! {
    /// Ref: https://wiki.nesdev.com/w/index.php/INES#Flags_7
    struct Flags7: u8 {
        const VS_UNISYSTEM  = 0b0000_0001;
        const PLAYCHOICE_10 = 0b0000_0010;
        const NES_2_0       = 0b0000_1100;
        const MAPPER_HIGH   = 0b1111_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// A fully parsed iNES image with derived addressing metadata (§3).
#[derive(Debug, Clone)]
pub struct ROMImage {
    pub prg_rom: Vec<u8>,
    pub chr_rom: Vec<u8>,
    pub prg_offset: usize,
    pub chr_offset: usize,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    pub has_battery: bool,
    pub has_trainer: bool,
    pub reset_vector: u16,
    pub nmi_vector: u16,
    pub irq_vector: u16,
    pub entry_points: HashSet<u16>,
}

impl ROMImage {
    /// Read-only view of the PRG bank, as mapped into CPU space at `0x8000`.
    pub fn prg_slice(&self) -> &[u8] {
        &self.prg_rom
    }

    /// Read-only view of the CHR bank. Not analyzed by this pipeline.
    pub fn chr_slice(&self) -> &[u8] {
        &self.chr_rom
    }

}

fn parse_header(input: &[u8]) -> IResult<&[u8], (u8, u8, u8, u8)> {
    let (input, _) = tag(b"NES\x1a")(input)?;
    let (input, (prg_banks, chr_banks, flags6, flags7)) =
        tuple((nom_u8, nom_u8, nom_u8, nom_u8))(input)?;
    // Remaining 8 header bytes (PRG-RAM size, flags9/10, 5 padding bytes):
    // not consulted. NES 2.0 extensions in the high mapper nibble are
    // ignored per §6.
    let (input, _rest) = take(8usize)(input)?;
    Ok((input, (prg_banks, chr_banks, flags6, flags7)))
}

fn parse_ines(input: &[u8]) -> IResult<&[u8], (u8, u8, u8, u8, &[u8])> {
    let (input, (prg_banks, chr_banks, flags6, flags7)) = parse_header(input)?;
    let has_trainer = flags6 & Flags6::TRAINER.bits() != 0;
    let (input, trainer) = cond(has_trainer, take(TRAINER_LENGTH))(input)?;
    Ok((input, (prg_banks, chr_banks, flags6, flags7, trainer.unwrap_or(&[]))))
}

/// Parse an iNES image per §4.1. Fails with `InvalidFormat` if the magic
/// bytes don't match or the declared PRG/CHR sizes exceed the buffer.
pub fn load(bytes: &[u8]) -> Result<ROMImage, AnalyzerError> {
    if bytes.len() < HEADER_LENGTH {
        return Err(AnalyzerError::InvalidFormat(format!(
            "file is only {} bytes, shorter than the 16-byte iNES header",
            bytes.len()
        )));
    }

    let (_, (prg_banks, chr_banks, flags6, flags7)) = parse_ines(bytes)
        .map(|(rest, (prg, chr, f6, f7, _trainer))| (rest, (prg, chr, f6, f7)))
        .map_err(|_| {
            AnalyzerError::InvalidFormat("magic bytes do not match iNES signature 4E 45 53 1A".to_string())
        })?;

    let has_trainer = flags6 & Flags6::TRAINER.bits() != 0;
    let prg_size = prg_banks as usize * PRG_ROM_PAGE_LENGTH;
    let chr_size = chr_banks as usize * CHR_ROM_PAGE_LENGTH;
    let prg_offset = HEADER_LENGTH + if has_trainer { TRAINER_LENGTH } else { 0 };
    let chr_offset = prg_offset + prg_size;

    if chr_offset + chr_size > bytes.len() {
        return Err(AnalyzerError::InvalidFormat(format!(
            "declared PRG+CHR size ({} bytes) exceeds file length ({} bytes)",
            prg_size + chr_size,
            bytes.len() - prg_offset
        )));
    }
    if prg_size == 0 {
        return Err(AnalyzerError::InvalidFormat("PRG ROM size is zero".to_string()));
    }

    let mapper_id = (flags7 & Flags7::MAPPER_HIGH.bits()) | (flags6 >> 4);
    let mirroring = if flags6 & Flags6::FOUR_SCREEN.bits() != 0 {
        Mirroring::FourScreen
    } else if flags6 & Flags6::VERTICAL.bits() != 0 {
        Mirroring::Vertical
    } else {
        Mirroring::Horizontal
    };
    let has_battery = flags6 & Flags6::BATTERY.bits() != 0;

    let prg_rom = bytes[prg_offset..prg_offset + prg_size].to_vec();
    let chr_rom = bytes[chr_offset..chr_offset + chr_size].to_vec();

    // Vectors live at the top of the PRG bank: CPU 0xFFFC/0xFFFA/0xFFFE,
    // i.e. the last 6 bytes of the PRG data.
    let reset_vector = LittleEndian::read_u16(&prg_rom[prg_size - 4..prg_size - 2]);
    let nmi_vector = LittleEndian::read_u16(&prg_rom[prg_size - 6..prg_size - 4]);
    let irq_vector = LittleEndian::read_u16(&prg_rom[prg_size - 2..prg_size]);

    let mut entry_points = HashSet::new();
    entry_points.insert(reset_vector);

    Ok(ROMImage {
        prg_rom,
        chr_rom,
        prg_offset,
        chr_offset,
        mapper_id,
        mirroring,
        has_battery,
        has_trainer,
        reset_vector,
        nmi_vector,
        irq_vector,
        entry_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_rom(prg: Vec<u8>) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LENGTH];
        bytes[0..4].copy_from_slice(b"NES\x1a");
        bytes[4] = (prg.len() / PRG_ROM_PAGE_LENGTH) as u8;
        bytes[5] = 0; // no CHR
        bytes.extend(prg);
        bytes
    }

    fn nop_prg_with_reset(reset: u16) -> Vec<u8> {
        let mut prg = vec![0xEAu8; PRG_ROM_PAGE_LENGTH];
        let len = prg.len();
        LittleEndian::write_u16(&mut prg[len - 6..len - 4], 0x8000); // nmi
        LittleEndian::write_u16(&mut prg[len - 4..len - 2], reset);
        LittleEndian::write_u16(&mut prg[len - 2..], 0x8000); // irq
        prg
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = minimal_rom(nop_prg_with_reset(0x8000));
        bytes[0] = b'X';
        assert!(matches!(load(&bytes), Err(AnalyzerError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_truncated_buffer() {
        let bytes = minimal_rom(vec![0xEA; 100]);
        assert!(matches!(load(&bytes), Err(AnalyzerError::InvalidFormat(_))));
    }

    #[test]
    fn parses_minimal_reset_vector() {
        let bytes = minimal_rom(nop_prg_with_reset(0x8000));
        let rom = load(&bytes).unwrap();
        assert_eq!(rom.reset_vector, 0x8000);
        assert_eq!(rom.nmi_vector, 0x8000);
        assert_eq!(rom.irq_vector, 0x8000);
        assert!(rom.entry_points.contains(&0x8000));
        assert_eq!(rom.prg_rom.len(), PRG_ROM_PAGE_LENGTH);
    }

    #[test]
    fn mapper_id_combines_both_nibbles() {
        let mut bytes = minimal_rom(nop_prg_with_reset(0x8000));
        bytes[6] = 0x10; // low nibble of mapper = 1
        bytes[7] = 0x20; // high nibble of mapper = 2
        let rom = load(&bytes).unwrap();
        assert_eq!(rom.mapper_id, 0x21);
    }

    #[test]
    fn four_screen_overrides_vertical_bit() {
        let mut bytes = minimal_rom(nop_prg_with_reset(0x8000));
        bytes[6] = 0b0000_1001; // vertical + four-screen
        let rom = load(&bytes).unwrap();
        assert_eq!(rom.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn trainer_shifts_prg_offset() {
        let mut prg = nop_prg_with_reset(0x8000);
        let mut bytes = vec![0u8; HEADER_LENGTH];
        bytes[0..4].copy_from_slice(b"NES\x1a");
        bytes[4] = (prg.len() / PRG_ROM_PAGE_LENGTH) as u8;
        bytes[5] = 0;
        bytes[6] = 0b0000_0100; // trainer flag
        bytes.extend(vec![0u8; TRAINER_LENGTH]);
        bytes.append(&mut prg);

        let rom = load(&bytes).unwrap();
        assert!(rom.has_trainer);
        assert_eq!(rom.prg_offset, HEADER_LENGTH + TRAINER_LENGTH);
    }
}
