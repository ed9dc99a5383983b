pub mod header;
pub mod rom;


pub use header::{CartridgeHeader, Mirroring};
pub use rom::{Rom, RomError};
