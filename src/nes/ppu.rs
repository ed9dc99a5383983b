//! Graphics-unit register interface as seen from the CPU bus.
//!
//! The bus only knows the eight mirrored registers at `$2000-$2007`; everything
//! behind them belongs to the graphics unit. [`RegisterFile`] is a minimal register
//! model used when no real graphics unit is attached (tooling, tests).

pub const PPU_REGISTER_BASE: u16 = 0x2000;
pub const PPU_REGISTER_COUNT: u16 = 8;

pub const PPUCTRL: u16 = 0x2000;
pub const PPUMASK: u16 = 0x2001;
pub const PPUSTATUS: u16 = 0x2002;
pub const OAMADDR: u16 = 0x2003;
pub const OAMDATA: u16 = 0x2004;
pub const PPUSCROLL: u16 = 0x2005;
pub const PPUADDR: u16 = 0x2006;
pub const PPUDATA: u16 = 0x2007;

/// Register proxy the bus delegates `$2000-$3FFF` to.
///
/// The bus always passes an address already folded into `$2000-$2007`.
/// Implementations should treat anything else as a decode bug.
pub trait PpuRegisters {
    fn read_register(&mut self, addr: u16) -> u8;
    fn write_register(&mut self, addr: u16, value: u8);
}

#[inline(always)]
fn register_index(addr: u16) -> usize {
    assert!(
        (PPU_REGISTER_BASE..PPU_REGISTER_BASE + PPU_REGISTER_COUNT).contains(&addr),
        "PPU register access outside $2000-$2007: ${:04X}",
        addr
    );
    (addr - PPU_REGISTER_BASE) as usize
}

/// Plain register storage with the shared `$2005/$2006` write latch.
#[derive(Debug, Default)]
pub struct RegisterFile {
    registers: [u8; PPU_REGISTER_COUNT as usize],
    // false: next $2005/$2006 write is the first one
    w: bool,
    t: u16,
    v: u16,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written to (or latched in) register `addr`.
    pub fn register(&self, addr: u16) -> u8 {
        self.registers[register_index(addr)]
    }

    /// Current VRAM address assembled from `$2006` writes.
    pub fn vram_addr(&self) -> u16 {
        self.v
    }

    pub fn write_latch(&self) -> bool {
        self.w
    }

    fn vram_increment(&self) -> u16 {
        if self.registers[0] & 0b0000_0100 != 0 { 32 } else { 1 }
    }
}

impl PpuRegisters for RegisterFile {
    fn read_register(&mut self, addr: u16) -> u8 {
        let index = register_index(addr);
        match addr {
            PPUSTATUS => {
                // Reading status resets the write latch
                self.w = false;
                self.registers[index]
            }
            PPUDATA => {
                let value = self.registers[index];
                self.v = self.v.wrapping_add(self.vram_increment()) & 0x3FFF;
                value
            }
            _ => self.registers[index],
        }
    }

    fn write_register(&mut self, addr: u16, value: u8) {
        let index = register_index(addr);
        self.registers[index] = value;
        match addr {
            PPUSCROLL => self.w = !self.w,
            PPUADDR => {
                if !self.w {
                    // First write (high byte of address)
                    self.t = (self.t & 0x00FF) | (((value as u16) & 0x3F) << 8);
                } else {
                    // Second write (low byte of address)
                    self.t = (self.t & 0xFF00) | value as u16;
                    self.v = self.t;
                }
                self.w = !self.w;
            }
            PPUDATA => {
                self.v = self.v.wrapping_add(self.vram_increment()) & 0x3FFF;
            }
            _ => {}
        }
    }
}
