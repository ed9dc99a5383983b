use log::{debug, warn};

use crate::nes::bus::consts::*;
use crate::nes::bus::{Access, BusEvent, BusMemory, Region, TraceHook, decode};
use crate::nes::memory::Memory;
use crate::nes::ppu::PpuRegisters;
use crate::nes::tracer::Traceable;

/// CPU address-space router.
///
/// Owns the RAM, I/O and expansion stores plus the program banks, and delegates the
/// `$2000-$3FFF` window to the graphics unit's register proxy.
pub struct NesBus<P: PpuRegisters> {
    cpu_ram: Memory,
    ppu: P,
    apu_io: Memory,
    expansion: Memory,

    // One store for images of 16 KiB or less (both slots point at it), two otherwise
    prg_banks: Vec<Memory>,
    prg_slots: [usize; 2],

    trace_hook: Option<TraceHook>,
}

impl<P: PpuRegisters> NesBus<P> {
    pub fn new(ppu: P) -> Self {
        Self {
            cpu_ram: Memory::new(CPU_RAM_SIZE),
            ppu,
            apu_io: Memory::new(APU_IO_SIZE),
            expansion: Memory::new(EXPANSION_SIZE),
            prg_banks: vec![Memory::new(PRG_BANK_SIZE)],
            prg_slots: [0, 0],
            trace_hook: None,
        }
    }

    /// Installs a program image into `$8000-$FFFF`.
    ///
    /// More than 16 KiB: the first 16 KiB become the lower bank and the next 16 KiB
    /// the upper bank; anything past 32 KiB is dropped. 16 KiB or less: a single
    /// store backs both banks, so `$C000-$FFFF` mirrors `$8000-$BFFF`.
    pub fn install_program(&mut self, program: &[u8]) {
        assert!(!program.is_empty(), "install_program called with an empty image");

        if program.len() > PRG_BANK_SIZE {
            if program.len() > 2 * PRG_BANK_SIZE {
                warn!(
                    "PRG ROM is {} bytes, only the first {} are mapped",
                    program.len(),
                    2 * PRG_BANK_SIZE
                );
            }
            let (lower_bytes, rest) = program.split_at(PRG_BANK_SIZE);
            let upper_bytes = &rest[..rest.len().min(PRG_BANK_SIZE)];

            let mut lower = Memory::new(PRG_BANK_SIZE);
            lower.write_n(0, lower_bytes);
            let mut upper = Memory::new(PRG_BANK_SIZE);
            upper.write_n(0, upper_bytes);

            self.prg_banks = vec![lower, upper];
            self.prg_slots = [0, 1];
        } else {
            let mut bank = Memory::new(PRG_BANK_SIZE);
            bank.write_n(0, program);

            self.prg_banks = vec![bank];
            self.prg_slots = [0, 0];
        }
        debug!(
            "Installed {} byte PRG image ({} bank(s))",
            program.len(),
            self.prg_banks.len()
        );
    }

    /// True when both program windows alias the same store.
    pub fn prg_mirrored(&self) -> bool {
        self.prg_slots[0] == self.prg_slots[1]
    }

    /// Clears RAM, I/O and expansion stores. Program banks are kept.
    pub fn reset(&mut self) {
        self.cpu_ram = Memory::new(CPU_RAM_SIZE);
        self.apu_io = Memory::new(APU_IO_SIZE);
        self.expansion = Memory::new(EXPANSION_SIZE);
    }

    pub fn set_trace_hook(&mut self, hook: TraceHook) {
        self.trace_hook = Some(hook);
    }

    pub fn clear_trace_hook(&mut self) {
        self.trace_hook = None;
    }

    pub fn ppu(&self) -> &P {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut P {
        &mut self.ppu
    }

    /// Reads a byte without touching the register proxy or the trace hook.
    ///
    /// Register-window addresses return `None` since reading them has side effects.
    pub fn peek(&self, addr: u16) -> Option<u8> {
        let (region, offset) = decode(addr);
        match region {
            Region::CpuRam => Some(self.cpu_ram.read(offset)),
            Region::PpuRegisters => None,
            Region::ApuIo => Some(self.apu_io.read(offset)),
            Region::Expansion => Some(self.expansion.read(offset)),
            Region::PrgLower => Some(self.prg_banks[self.prg_slots[0]].read(offset)),
            Region::PrgUpper => Some(self.prg_banks[self.prg_slots[1]].read(offset)),
        }
    }

    #[inline(always)]
    fn trace(&mut self, access: Access, addr: u16, region: Region, offset: usize, value: u8) {
        if let Some(hook) = self.trace_hook.as_mut() {
            hook(&BusEvent {
                access,
                addr,
                region,
                offset,
                value,
            });
        }
    }
}

impl<P: PpuRegisters> BusMemory for NesBus<P> {
    fn read_byte(&mut self, addr: u16) -> u8 {
        let (region, offset) = decode(addr);
        let value = match region {
            Region::CpuRam => self.cpu_ram.read(offset),
            // Registers mirrored every 8 bytes, folded by `decode`
            Region::PpuRegisters => self.ppu.read_register(offset as u16),
            Region::ApuIo => self.apu_io.read(offset),
            Region::Expansion => self.expansion.read(offset),
            Region::PrgLower => self.prg_banks[self.prg_slots[0]].read(offset),
            Region::PrgUpper => self.prg_banks[self.prg_slots[1]].read(offset),
        };
        self.trace(Access::Read, addr, region, offset, value);
        value
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        let (region, offset) = decode(addr);
        match region {
            Region::CpuRam => self.cpu_ram.write(offset, value),
            Region::PpuRegisters => self.ppu.write_register(offset as u16, value),
            Region::ApuIo => self.apu_io.write(offset, value),
            Region::Expansion => self.expansion.write(offset, value),
            Region::PrgLower | Region::PrgUpper => {
                debug!("Ignoring write of ${:02X} to PRG ROM at ${:04X}", value, addr);
            }
        }
        self.trace(Access::Write, addr, region, offset, value);
    }
}

impl<P: PpuRegisters> Traceable for NesBus<P> {
    fn trace_name(&self) -> &'static str {
        "BUS"
    }

    fn trace_state(&self) -> Option<String> {
        Some(format!(
            "prg_banks={} mirrored={} tracing={}",
            self.prg_banks.len(),
            self.prg_mirrored(),
            self.trace_hook.is_some()
        ))
    }
}
