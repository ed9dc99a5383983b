//! Convenient imports for consumers of nes-cartbus
//!
//! Pull in everything commonly needed in one line:
//! ```rust
//! use nes_cartbus::prelude::*;
//! ```

// Session and bus
pub use crate::nes::NES;
pub use crate::nes::bus::nes_bus::NesBus;
pub use crate::nes::bus::{Access, BusEvent, BusMemory, Region, TraceHook};

// Cartridge
pub use crate::nes::cartridge::header::{
    CartridgeHeader, ConsoleType, FormatVersion, Mirroring, TimingRegion,
};
pub use crate::nes::cartridge::rom::{Rom, RomError};

// Graphics-unit register proxy
pub use crate::nes::ppu::{PpuRegisters, RegisterFile};

// Tracing
pub use crate::nes::tracer::{TRACER, Traceable, Tracer};
