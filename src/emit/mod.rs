pub mod asm;
pub mod c;

pub use asm::emit_asm;
pub use c::{emit_c, EmittedC};
