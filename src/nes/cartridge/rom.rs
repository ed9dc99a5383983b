use std::fs;
use std::path::Path;

use log::{debug, warn};
use thiserror::Error;

use super::header::{CartridgeHeader, FormatVersion, HEADER_SIZE, TRAINER_SIZE};

#[derive(Debug, Error)]
pub enum RomError {
    #[error("Truncated header: expected 16 bytes, got {len}")]
    TruncatedHeader { len: usize },

    #[error("{0}")]
    InvalidFormat(String),

    #[error("Truncated {section}: expected {expected} bytes, only {available} available")]
    TruncatedData {
        section: &'static str,
        expected: usize,
        available: usize,
    },

    #[error("Cartridge declares no PRG ROM")]
    EmptyProgram,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A parsed cartridge file: header plus the data sections that follow it.
#[derive(Clone, Debug)]
pub struct Rom {
    pub header: CartridgeHeader,
    pub trainer: Option<Vec<u8>>,
    pub prg_rom: Vec<u8>,
    pub chr_rom: Vec<u8>,
    pub misc_rom: Vec<u8>,
}

fn take<'a>(
    raw: &'a [u8],
    start: usize,
    len: usize,
    section: &'static str,
) -> Result<&'a [u8], RomError> {
    let available = raw.len().saturating_sub(start);
    if len > available {
        return Err(RomError::TruncatedData {
            section,
            expected: len,
            available,
        });
    }
    Ok(&raw[start..start + len])
}

impl Rom {
    pub fn parse(raw: &[u8]) -> Result<Rom, RomError> {
        let header = CartridgeHeader::parse(raw)?;

        let mut cursor = HEADER_SIZE;

        let trainer = if header.has_trainer() {
            let trainer = take(raw, cursor, TRAINER_SIZE, "trainer")?.to_vec();
            cursor += TRAINER_SIZE;
            debug!("Skipped {} byte trainer before PRG ROM", TRAINER_SIZE);
            Some(trainer)
        } else {
            None
        };

        let prg_rom_size = header.prg_rom_bytes();
        let prg_rom = take(raw, cursor, prg_rom_size, "PRG ROM")?.to_vec();
        cursor += prg_rom_size;

        let chr_rom_size = header.chr_rom_bytes();
        let chr_rom = take(raw, cursor, chr_rom_size, "CHR ROM")?.to_vec();
        cursor += chr_rom_size;

        let rest = &raw[cursor..];
        let misc_rom = match header.version() {
            FormatVersion::Extended if header.misc_rom_count() > 0 => rest.to_vec(),
            _ => {
                if !rest.is_empty() {
                    warn!("Ignoring {} trailing bytes after CHR ROM", rest.len());
                }
                Vec::new()
            }
        };

        Ok(Rom {
            header,
            trainer,
            prg_rom,
            chr_rom,
            misc_rom,
        })
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Rom, RomError> {
        let raw = fs::read(path)?;
        Rom::parse(&raw)
    }
}
