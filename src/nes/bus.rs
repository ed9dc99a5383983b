use std::fmt;

pub mod consts;
pub mod nes_bus;

#[cfg(test)]
mod nes_bus_test;

use consts::*;

/// CPU-visible memory access. Word accesses are little-endian.
pub trait BusMemory {
    fn read_byte(&mut self, addr: u16) -> u8;
    fn write_byte(&mut self, addr: u16, value: u8);

    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read_byte(addr) as u16;
        let hi = self.read_byte(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Low byte goes out first; registers behind the bus may latch on write order.
    fn write_word(&mut self, addr: u16, value: u16) {
        self.write_byte(addr, value as u8);
        self.write_byte(addr.wrapping_add(1), (value >> 8) as u8);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Region {
    CpuRam,
    PpuRegisters,
    ApuIo,
    Expansion,
    PrgLower,
    PrgUpper,
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Region::CpuRam => "CPU RAM",
            Region::PpuRegisters => "PPU",
            Region::ApuIo => "APU/IO",
            Region::Expansion => "EXP",
            Region::PrgLower => "PRG lo",
            Region::PrgUpper => "PRG hi",
        }
    }
}

/// One resolved bus access, handed to the trace hook.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusEvent {
    pub access: Access,
    pub addr: u16,
    pub region: Region,
    pub offset: usize,
    pub value: u8,
}

impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.access {
            Access::Read => "R",
            Access::Write => "W",
        };
        write!(
            f,
            "{} ${:04X} {}[${:04X}] = ${:02X}",
            op,
            self.addr,
            self.region.name(),
            self.offset,
            self.value
        )
    }
}

pub type TraceHook = Box<dyn FnMut(&BusEvent)>;

/// Maps a CPU address to the region that owns it and the offset inside that region.
///
/// Total over the 16-bit address space. For [`Region::PpuRegisters`] the offset is
/// the folded register address `$2000-$2007` handed to the register proxy.
pub fn decode(addr: u16) -> (Region, usize) {
    match addr {
        CPU_RAM_START..=CPU_RAM_END => (Region::CpuRam, (addr & CPU_RAM_MIRROR_MASK) as usize),
        PPU_REGISTERS_START..=PPU_REGISTERS_END => (
            Region::PpuRegisters,
            (PPU_REGISTERS_START + ((addr - PPU_REGISTERS_START) & PPU_REGISTERS_MIRROR_MASK))
                as usize,
        ),
        APU_IO_START..=APU_IO_END => (Region::ApuIo, (addr - APU_IO_START) as usize),
        EXPANSION_START..=EXPANSION_END => (Region::Expansion, (addr - EXPANSION_START) as usize),
        PRG_LOWER_START..=PRG_LOWER_END => (Region::PrgLower, (addr - PRG_LOWER_START) as usize),
        PRG_UPPER_START..=PRG_UPPER_END => (Region::PrgUpper, (addr - PRG_UPPER_START) as usize),
    }
}
