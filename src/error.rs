use thiserror::Error;

/// Error taxonomy for the analysis pipeline.
///
/// Only `InvalidFormat` and `LoopbackToZero` are fatal to the whole-program
/// pipeline; the rest degrade a single instruction or a single function and
/// are surfaced without aborting `analyze`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("invalid iNES image: {0}")]
    InvalidFormat(String),

    #[error("unknown opcode 0x{opcode:02X} at ${address:04X}")]
    UnknownOpcode { address: u16, opcode: u8 },

    #[error("operand bytes unavailable at ${address:04X} (region ends before operand)")]
    OutOfBounds { address: u16 },

    #[error("no code region covers address ${address:04X}")]
    RegionMissing { address: u16 },

    #[error("loopback repair would target CPU address 0x0000, rejected as nonsensical")]
    LoopbackToZero,

    #[error("disassembly re-sweep hit the iteration cap ({cap}) with references still unresolved")]
    Saturated { cap: u32 },
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
