//! `CodeRegion`: a window of PRG data mapped contiguously into CPU space.
//!
//! Grounded on §3's `CodeRegion` type. A single fixed bank is assumed
//! (§1 non-goals), but a 16KiB PRG bank mirrors into the upper half of CPU
//! space, so `regions_for_rom` yields two regions in that case rather than
//! hard-coding one — this is where multi-region (future mapper) support
//! would extend.

use crate::rom::{ROMImage, PRG_BASE, PRG_ROM_PAGE_LENGTH};

#[derive(Debug, Clone, Copy)]
pub struct CodeRegion<'a> {
    pub base_address: u16,
    pub bytes: &'a [u8],
}

impl<'a> CodeRegion<'a> {
    pub fn covers(&self, address: u16) -> bool {
        address >= self.base_address && (address as usize) < self.base_address as usize + self.bytes.len()
    }

    pub fn offset_of(&self, address: u16) -> Option<usize> {
        if self.covers(address) {
            Some((address - self.base_address) as usize)
        } else {
            None
        }
    }
}

/// Build the regions covering a ROM's PRG bank as mapped into CPU space.
pub fn regions_for_rom(rom: &ROMImage) -> Vec<CodeRegion<'_>> {
    let mut regions = vec![CodeRegion {
        base_address: PRG_BASE,
        bytes: &rom.prg_rom,
    }];
    if rom.prg_rom.len() == PRG_ROM_PAGE_LENGTH {
        regions.push(CodeRegion {
            base_address: PRG_BASE + PRG_ROM_PAGE_LENGTH as u16,
            bytes: &rom.prg_rom,
        });
    }
    regions
}

/// Locate the region covering `address`, if any.
pub fn find_region<'a>(regions: &'a [CodeRegion<'a>], address: u16) -> Option<&'a CodeRegion<'a>> {
    regions.iter().find(|r| r.covers(address))
}
