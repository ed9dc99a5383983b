// Cartridge header decoding and CPU address-space routing
pub mod nes;
pub mod prelude;

// Re-exports
pub use nes::NES;

pub use nes::bus::nes_bus::NesBus;
pub use nes::cartridge::header::CartridgeHeader;
pub use nes::cartridge::rom::{Rom, RomError};
