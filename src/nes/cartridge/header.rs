use std::fmt;

use bitflags::bitflags;

use super::rom::RomError;
use crate::nes::tracer::Traceable;

pub const NES_MAGIC_BYTES: &[u8; 4] = b"NES\x1A";
pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_ROM_PAGE_SIZE: usize = 0x4000;
pub const CHR_ROM_PAGE_SIZE: usize = 0x2000;
pub const LEGACY_PRG_RAM_PAGE_SIZE: usize = 0x2000;

bitflags! {
    /* See: https://www.nesdev.org/wiki/INES#Flags_6
        7  bit  0
        ---- ----
        NNNN FTBM
        |||| ||||
        |||| |||+- Nametable arrangement (0: horizontal mirroring, 1: vertical mirroring)
        |||| ||+-- Battery-backed PRG RAM at $6000-$7FFF
        |||| |+--- 512-byte trainer at $7000-$71FF
        |||| +---- Alternative nametable layout (four-screen)
        ++++------ Lower nybble of mapper number
     */
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Flags6: u8 {
        const VERTICAL_MIRRORING = 0b0000_0001;
        const BATTERY =            0b0000_0010;
        const TRAINER =            0b0000_0100;
        const FOUR_SCREEN =        0b0000_1000;
        const MAPPER_LOW =         0b1111_0000;
    }
}

bitflags! {
    /* See: https://www.nesdev.org/wiki/NES_2.0#Header
        7  bit  0
        ---- ----
        NNNN VVCC
        |||| ||||
        |||| ||++- Legacy: bit 0 Vs. Unisystem, bit 1 PlayChoice-10
        |||| ||    Extended: console type (0..=3)
        |||| ++--- 0b10 marks the extended (NES 2.0) container
        ++++------ Upper nybble of mapper number
     */
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Flags7: u8 {
        const VS_UNISYSTEM =  0b0000_0001;
        const PLAYCHOICE_10 = 0b0000_0010;
        const CONSOLE_TYPE =  0b0000_0011;
        const VERSION =       0b0000_1100;
        const MAPPER_HIGH =   0b1111_0000;
    }
}

const EXTENDED_VERSION_ID: u8 = 0b0000_1000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormatVersion {
    /// iNES 1.0
    Legacy,
    /// NES 2.0
    Extended,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConsoleType {
    Standard,
    VsSystem,
    PlayChoice10,
    Extended,
}

impl ConsoleType {
    const TABLE: [ConsoleType; 4] = [
        ConsoleType::Standard,
        ConsoleType::VsSystem,
        ConsoleType::PlayChoice10,
        ConsoleType::Extended,
    ];
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimingRegion {
    Ntsc,
    Pal,
    MultiRegion,
    Dendy,
}

impl TimingRegion {
    const TABLE: [TimingRegion; 4] = [
        TimingRegion::Ntsc,
        TimingRegion::Pal,
        TimingRegion::MultiRegion,
        TimingRegion::Dendy,
    ];
}

/// Vs. System PPU variant (byte 13, low nybble).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VsPpuType {
    Rp2C03B,
    Rp2C03G,
    Rp2C04_0001,
    Rp2C04_0002,
    Rp2C04_0003,
    Rp2C04_0004,
    Rc2C03B,
    Rc2C03C,
    Rc2C05_01,
    Rc2C05_02,
    Rc2C05_03,
    Rc2C05_04,
    Rc2C05_05,
    Unknown(u8),
}

impl From<u8> for VsPpuType {
    fn from(value: u8) -> Self {
        match value & 0x0F {
            0x0 => VsPpuType::Rp2C03B,
            0x1 => VsPpuType::Rp2C03G,
            0x2 => VsPpuType::Rp2C04_0001,
            0x3 => VsPpuType::Rp2C04_0002,
            0x4 => VsPpuType::Rp2C04_0003,
            0x5 => VsPpuType::Rp2C04_0004,
            0x6 => VsPpuType::Rc2C03B,
            0x7 => VsPpuType::Rc2C03C,
            0x8 => VsPpuType::Rc2C05_01,
            0x9 => VsPpuType::Rc2C05_02,
            0xA => VsPpuType::Rc2C05_03,
            0xB => VsPpuType::Rc2C05_04,
            0xC => VsPpuType::Rc2C05_05,
            other => VsPpuType::Unknown(other),
        }
    }
}

/// Vs. System board wiring (byte 13, high nybble).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VsHardwareType {
    Unisystem,
    UnisystemRbiBaseball,
    UnisystemTkoBoxing,
    UnisystemSuperXevious,
    UnisystemIceClimberJapan,
    DualSystem,
    DualSystemRaidOnBungelingBay,
    Unknown(u8),
}

impl From<u8> for VsHardwareType {
    fn from(value: u8) -> Self {
        match value & 0x0F {
            0x0 => VsHardwareType::Unisystem,
            0x1 => VsHardwareType::UnisystemRbiBaseball,
            0x2 => VsHardwareType::UnisystemTkoBoxing,
            0x3 => VsHardwareType::UnisystemSuperXevious,
            0x4 => VsHardwareType::UnisystemIceClimberJapan,
            0x5 => VsHardwareType::DualSystem,
            0x6 => VsHardwareType::DualSystemRaidOnBungelingBay,
            other => VsHardwareType::Unknown(other),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VsSystemType {
    pub ppu: VsPpuType,
    pub hardware: VsHardwareType,
}

/// Console family when flags 7 selects the "extended" console type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExtendedConsoleType {
    Regular,
    VsSystem,
    PlayChoice10,
    FamicloneDecimalMode,
    EpsmModule,
    Vt01,
    Vt02,
    Vt03,
    Vt09,
    Vt32,
    Vt369,
    UmcUm6578,
    FamicomNetworkSystem,
    Reserved(u8),
}

impl From<u8> for ExtendedConsoleType {
    fn from(value: u8) -> Self {
        match value & 0x0F {
            0x0 => ExtendedConsoleType::Regular,
            0x1 => ExtendedConsoleType::VsSystem,
            0x2 => ExtendedConsoleType::PlayChoice10,
            0x3 => ExtendedConsoleType::FamicloneDecimalMode,
            0x4 => ExtendedConsoleType::EpsmModule,
            0x5 => ExtendedConsoleType::Vt01,
            0x6 => ExtendedConsoleType::Vt02,
            0x7 => ExtendedConsoleType::Vt03,
            0x8 => ExtendedConsoleType::Vt09,
            0x9 => ExtendedConsoleType::Vt32,
            0xA => ExtendedConsoleType::Vt369,
            0xB => ExtendedConsoleType::UmcUm6578,
            0xC => ExtendedConsoleType::FamicomNetworkSystem,
            other => ExtendedConsoleType::Reserved(other),
        }
    }
}

/// Default expansion device id (byte 15, low six bits).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExpansionDevice(u8);

impl ExpansionDevice {
    pub fn id(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            0x00 => "Unspecified",
            0x01 => "Standard controllers",
            0x02 => "Four Score",
            0x03 => "Famicom four-player adapter",
            0x04 => "Vs. System (1P via $4016)",
            0x05 => "Vs. System (1P via $4017)",
            0x07 => "Vs. Zapper",
            0x08 => "Zapper ($4017)",
            0x09 => "Two Zappers",
            0x0A => "Bandai Hyper Shot",
            0x0B => "Power Pad side A",
            0x0C => "Power Pad side B",
            0x0D => "Family Trainer side A",
            0x0E => "Family Trainer side B",
            0x0F => "Arkanoid Vaus (NES)",
            0x10 => "Arkanoid Vaus (Famicom)",
            0x13 => "Konami Hyper Shot",
            0x17 => "Family BASIC keyboard",
            0x1F => "Family BASIC keyboard with data recorder",
            0x23 => "SNES controller",
            0x2A => "Multicart",
            _ => "Unknown",
        }
    }
}

/// Decoded 16-byte cartridge header.
///
/// Built once by [`CartridgeHeader::parse`] and never mutated afterwards. Every field
/// is derived from the raw bytes by masking and shifting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CartridgeHeader {
    identification: [u8; 4],
    prg_rom_lsb: u8,
    chr_rom_lsb: u8,
    prg_rom_msb: u8,
    chr_rom_msb: u8,
    flags6: Flags6,
    flags7: Flags7,

    horizontal_mirroring: bool,
    vertical_mirroring: bool,
    four_screen: bool,
    battery: bool,
    trainer: bool,

    console_type: ConsoleType,
    version: FormatVersion,
    mapper: u16,
    submapper: u8,

    prg_ram_size: usize,
    prg_nvram_size: usize,
    chr_ram_size: usize,
    chr_nvram_size: usize,

    timing: TimingRegion,
    vs_system: Option<VsSystemType>,
    extended_console: Option<ExtendedConsoleType>,
    misc_rom_count: u8,
    expansion_device: ExpansionDevice,
}

/// RAM size from a NES 2.0 shift count: zero means no RAM, otherwise `64 << count`.
pub fn shift_count_size(count: u8) -> usize {
    if count == 0 { 0 } else { 64usize << count }
}

/// 12-bit declared ROM size: MSB nybble shifted above the LSB byte.
fn combine_size(msb: u8, lsb: u8) -> u16 {
    (((msb & 0x0F) as u16) << 8) | lsb as u16
}

/// Byte count of a declared ROM size, handling the exponent-multiplier notation
/// used when the MSB nybble is `0xF`.
fn rom_bytes(msb: u8, lsb: u8, page_size: usize) -> usize {
    if msb & 0x0F == 0x0F {
        let exponent = (lsb >> 2) as u32;
        let multiplier = (lsb & 0b11) as usize * 2 + 1;
        1usize
            .checked_shl(exponent)
            .map_or(usize::MAX, |base| base.saturating_mul(multiplier))
    } else {
        combine_size(msb, lsb) as usize * page_size
    }
}

impl CartridgeHeader {
    /// Decodes the first [`HEADER_SIZE`] bytes of `raw`.
    ///
    /// Unknown mapper numbers are kept as data; only truncation and a bad magic tag
    /// are rejected.
    pub fn parse(raw: &[u8]) -> Result<CartridgeHeader, RomError> {
        if raw.len() < HEADER_SIZE {
            return Err(RomError::TruncatedHeader { len: raw.len() });
        }
        let raw = &raw[..HEADER_SIZE];
        if &raw[0..4] != NES_MAGIC_BYTES {
            return Err(RomError::InvalidFormat(format!(
                "bad identification bytes {:02X?}, not an iNES file",
                &raw[0..4]
            )));
        }

        let flags6 = Flags6::from_bits_retain(raw[6]);
        let flags7 = Flags7::from_bits_retain(raw[7]);

        let vertical_mirroring = flags6.contains(Flags6::VERTICAL_MIRRORING);
        let mapper_low = (flags6 & Flags6::MAPPER_LOW).bits() >> 4;
        let mapper_high = (flags7 & Flags7::MAPPER_HIGH).bits() >> 4;

        let version = if (flags7 & Flags7::VERSION).bits() == EXTENDED_VERSION_ID {
            FormatVersion::Extended
        } else {
            FormatVersion::Legacy
        };

        let mut header = CartridgeHeader {
            identification: [raw[0], raw[1], raw[2], raw[3]],
            prg_rom_lsb: raw[4],
            chr_rom_lsb: raw[5],
            prg_rom_msb: 0,
            chr_rom_msb: 0,
            flags6,
            flags7,

            horizontal_mirroring: !vertical_mirroring,
            vertical_mirroring,
            four_screen: flags6.contains(Flags6::FOUR_SCREEN),
            battery: flags6.contains(Flags6::BATTERY),
            trainer: flags6.contains(Flags6::TRAINER),

            console_type: ConsoleType::Standard,
            version,
            mapper: ((mapper_high as u16) << 4) | mapper_low as u16,
            submapper: 0,

            prg_ram_size: 0,
            prg_nvram_size: 0,
            chr_ram_size: 0,
            chr_nvram_size: 0,

            timing: TimingRegion::Ntsc,
            vs_system: None,
            extended_console: None,
            misc_rom_count: 0,
            expansion_device: ExpansionDevice(0),
        };

        match version {
            FormatVersion::Legacy => header.decode_legacy(raw),
            FormatVersion::Extended => header.decode_extended(raw),
        }

        Ok(header)
    }

    fn decode_legacy(&mut self, raw: &[u8]) {
        self.console_type = if self.flags7.contains(Flags7::VS_UNISYSTEM) {
            ConsoleType::VsSystem
        } else if self.flags7.contains(Flags7::PLAYCHOICE_10) {
            ConsoleType::PlayChoice10
        } else {
            ConsoleType::Standard
        };
        self.prg_ram_size = raw[8] as usize * LEGACY_PRG_RAM_PAGE_SIZE;
        self.timing = TimingRegion::TABLE[(raw[9] & 0b1) as usize];
    }

    fn decode_extended(&mut self, raw: &[u8]) {
        self.console_type = ConsoleType::TABLE[(self.flags7 & Flags7::CONSOLE_TYPE).bits() as usize];

        // Byte 8: mapper bits 8-11 and submapper
        self.mapper |= ((raw[8] & 0x0F) as u16) << 8;
        self.submapper = raw[8] >> 4;

        // Byte 9: ROM size MSB nybbles
        self.prg_rom_msb = raw[9] & 0x0F;
        self.chr_rom_msb = raw[9] >> 4;

        // Bytes 10-11: RAM shift counts
        self.prg_ram_size = shift_count_size(raw[10] & 0x0F);
        self.prg_nvram_size = shift_count_size(raw[10] >> 4);
        self.chr_ram_size = shift_count_size(raw[11] & 0x0F);
        self.chr_nvram_size = shift_count_size(raw[11] >> 4);

        self.timing = TimingRegion::TABLE[(raw[12] & 0b11) as usize];

        match self.console_type {
            ConsoleType::VsSystem => {
                self.vs_system = Some(VsSystemType {
                    ppu: VsPpuType::from(raw[13] & 0x0F),
                    hardware: VsHardwareType::from(raw[13] >> 4),
                });
            }
            ConsoleType::Extended => {
                self.extended_console = Some(ExtendedConsoleType::from(raw[13] & 0x0F));
            }
            ConsoleType::Standard | ConsoleType::PlayChoice10 => {}
        }

        self.misc_rom_count = raw[14] & 0b11;
        self.expansion_device = ExpansionDevice(raw[15] & 0b0011_1111);
    }

    pub fn identification(&self) -> [u8; 4] {
        self.identification
    }

    pub fn flags6(&self) -> Flags6 {
        self.flags6
    }

    pub fn flags7(&self) -> Flags7 {
        self.flags7
    }

    pub fn prg_rom_lsb(&self) -> u8 {
        self.prg_rom_lsb
    }

    pub fn prg_rom_msb(&self) -> u8 {
        self.prg_rom_msb
    }

    pub fn chr_rom_lsb(&self) -> u8 {
        self.chr_rom_lsb
    }

    pub fn chr_rom_msb(&self) -> u8 {
        self.chr_rom_msb
    }

    /// Declared PRG ROM size in 16 KiB units (12 bits).
    pub fn prg_rom_size(&self) -> u16 {
        combine_size(self.prg_rom_msb, self.prg_rom_lsb)
    }

    /// Declared CHR ROM size in 8 KiB units (12 bits).
    pub fn chr_rom_size(&self) -> u16 {
        combine_size(self.chr_rom_msb, self.chr_rom_lsb)
    }

    pub fn prg_rom_bytes(&self) -> usize {
        rom_bytes(self.prg_rom_msb, self.prg_rom_lsb, PRG_ROM_PAGE_SIZE)
    }

    pub fn chr_rom_bytes(&self) -> usize {
        rom_bytes(self.chr_rom_msb, self.chr_rom_lsb, CHR_ROM_PAGE_SIZE)
    }

    pub fn horizontal_mirroring(&self) -> bool {
        self.horizontal_mirroring
    }

    pub fn vertical_mirroring(&self) -> bool {
        self.vertical_mirroring
    }

    pub fn four_screen(&self) -> bool {
        self.four_screen
    }

    pub fn mirroring(&self) -> Mirroring {
        match (self.four_screen, self.vertical_mirroring) {
            (true, _) => Mirroring::FourScreen,
            (false, true) => Mirroring::Vertical,
            (false, false) => Mirroring::Horizontal,
        }
    }

    pub fn has_battery(&self) -> bool {
        self.battery
    }

    pub fn has_trainer(&self) -> bool {
        self.trainer
    }

    pub fn console_type(&self) -> ConsoleType {
        self.console_type
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn mapper(&self) -> u16 {
        self.mapper
    }

    pub fn submapper(&self) -> u8 {
        self.submapper
    }

    pub fn prg_ram_size(&self) -> usize {
        self.prg_ram_size
    }

    pub fn prg_nvram_size(&self) -> usize {
        self.prg_nvram_size
    }

    pub fn chr_ram_size(&self) -> usize {
        self.chr_ram_size
    }

    pub fn chr_nvram_size(&self) -> usize {
        self.chr_nvram_size
    }

    pub fn timing(&self) -> TimingRegion {
        self.timing
    }

    /// Only present when the console type is Vs. System in an extended header.
    pub fn vs_system(&self) -> Option<VsSystemType> {
        self.vs_system
    }

    /// Only present when the console type is `Extended`.
    pub fn extended_console(&self) -> Option<ExtendedConsoleType> {
        self.extended_console
    }

    pub fn misc_rom_count(&self) -> u8 {
        self.misc_rom_count
    }

    pub fn expansion_device(&self) -> ExpansionDevice {
        self.expansion_device
    }
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

impl fmt::Display for CartridgeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = match self.version {
            FormatVersion::Legacy => "iNES 1.0",
            FormatVersion::Extended => "NES 2.0",
        };
        writeln!(f, "Format:           {}", version)?;
        writeln!(
            f,
            "Mapper:           {} (submapper {})",
            self.mapper, self.submapper
        )?;
        writeln!(
            f,
            "PRG ROM:          {} x 16 KiB ({})",
            self.prg_rom_size(),
            format_size(self.prg_rom_bytes())
        )?;
        writeln!(
            f,
            "CHR ROM:          {} x 8 KiB ({})",
            self.chr_rom_size(),
            format_size(self.chr_rom_bytes())
        )?;
        writeln!(f, "Mirroring:        {:?}", self.mirroring())?;
        writeln!(f, "Battery:          {}", self.battery)?;
        writeln!(f, "Trainer:          {}", self.trainer)?;
        writeln!(
            f,
            "PRG RAM / NVRAM:  {} / {}",
            format_size(self.prg_ram_size),
            format_size(self.prg_nvram_size)
        )?;
        writeln!(
            f,
            "CHR RAM / NVRAM:  {} / {}",
            format_size(self.chr_ram_size),
            format_size(self.chr_nvram_size)
        )?;
        writeln!(f, "Console:          {:?}", self.console_type)?;
        if let Some(vs) = self.vs_system {
            writeln!(f, "Vs. PPU:          {:?}", vs.ppu)?;
            writeln!(f, "Vs. hardware:     {:?}", vs.hardware)?;
        }
        if let Some(extended) = self.extended_console {
            writeln!(f, "Extended console: {:?}", extended)?;
        }
        writeln!(f, "Timing:           {:?}", self.timing)?;
        writeln!(f, "Misc ROMs:        {}", self.misc_rom_count)?;
        write!(
            f,
            "Expansion device: {} (${:02X})",
            self.expansion_device.name(),
            self.expansion_device.id()
        )
    }
}

impl Traceable for CartridgeHeader {
    fn trace_name(&self) -> &'static str {
        "CART"
    }

    fn trace_state(&self) -> Option<String> {
        Some(format!(
            "mapper={} sub={} prg={}B chr={}B mirroring={:?}",
            self.mapper,
            self.submapper,
            self.prg_rom_bytes(),
            self.chr_rom_bytes(),
            self.mirroring()
        ))
    }
}
