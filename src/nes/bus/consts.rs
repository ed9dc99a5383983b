pub const CPU_RAM_SIZE: usize = 0x0800;
pub const CPU_RAM_START: u16 = 0x0000;
pub const CPU_RAM_END: u16 = 0x1FFF;
pub const CPU_RAM_MIRROR_MASK: u16 = 0x07FF;

pub const PPU_REGISTERS_START: u16 = 0x2000;
pub const PPU_REGISTERS_END: u16 = 0x3FFF;
pub const PPU_REGISTERS_MIRROR_MASK: u16 = 0x0007;

pub const APU_IO_SIZE: usize = 0x0020;
pub const APU_IO_START: u16 = 0x4000;
pub const APU_IO_END: u16 = 0x401F;

pub const EXPANSION_SIZE: usize = 0x3FE0;
pub const EXPANSION_START: u16 = 0x4020;
pub const EXPANSION_END: u16 = 0x7FFF;

pub const PRG_BANK_SIZE: usize = 0x4000;
pub const PRG_LOWER_START: u16 = 0x8000;
pub const PRG_LOWER_END: u16 = 0xBFFF;
pub const PRG_UPPER_START: u16 = 0xC000;
pub const PRG_UPPER_END: u16 = 0xFFFF;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;
