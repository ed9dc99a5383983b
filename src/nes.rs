pub mod bus;
pub mod cartridge;
pub mod memory;
pub mod ppu;
pub mod tracer;

use std::path::Path;

use log::info;

use bus::BusMemory;
use bus::consts::{IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};
use bus::nes_bus::NesBus;
use cartridge::header::CartridgeHeader;
use cartridge::rom::{Rom, RomError};
use ppu::PpuRegisters;

/// One emulation session: the bus and the cartridge currently plugged into it.
pub struct NES<P: PpuRegisters> {
    pub bus: NesBus<P>,
    header: Option<CartridgeHeader>,
}

impl<P: PpuRegisters> NES<P> {
    pub fn new(ppu: P) -> Self {
        Self {
            bus: NesBus::new(ppu),
            header: None,
        }
    }

    pub fn parse_rom_bytes(rom_bytes: &[u8]) -> Result<Rom, RomError> {
        Rom::parse(rom_bytes)
    }

    /// Installs the cartridge's program ROM and keeps its header.
    ///
    /// Refuses images that declare no program ROM instead of handing the bus an empty
    /// image.
    pub fn insert_cartridge(&mut self, rom: Rom) -> Result<(), RomError> {
        if rom.prg_rom.is_empty() {
            return Err(RomError::EmptyProgram);
        }
        info!(
            "Inserting cartridge: mapper {} with {} bytes PRG ROM",
            rom.header.mapper(),
            rom.prg_rom.len()
        );
        self.bus.install_program(&rom.prg_rom);
        self.bus.reset();
        self.header = Some(rom.header);
        Ok(())
    }

    pub fn load_rom_file<T: AsRef<Path>>(&mut self, path: T) -> Result<CartridgeHeader, RomError> {
        let rom = Rom::load_file(path)?;
        let header = rom.header;
        self.insert_cartridge(rom)?;
        Ok(header)
    }

    pub fn header(&self) -> Option<&CartridgeHeader> {
        self.header.as_ref()
    }

    pub fn bus(&self) -> &NesBus<P> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut NesBus<P> {
        &mut self.bus
    }

    pub fn nmi_vector(&mut self) -> u16 {
        self.bus.read_word(NMI_VECTOR)
    }

    pub fn reset_vector(&mut self) -> u16 {
        self.bus.read_word(RESET_VECTOR)
    }

    pub fn irq_vector(&mut self) -> u16 {
        self.bus.read_word(IRQ_VECTOR)
    }
}
