#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::nes::bus::nes_bus::NesBus;
    use crate::nes::bus::{Access, BusEvent, BusMemory, Region, decode};
    use crate::nes::ppu::{PpuRegisters, RegisterFile};

    /// Register proxy that records every delegated access in order.
    #[derive(Default)]
    struct RecordingPpu {
        writes: Vec<(u16, u8)>,
        reads: Vec<u16>,
    }

    impl PpuRegisters for RecordingPpu {
        fn read_register(&mut self, addr: u16) -> u8 {
            assert!((0x2000..=0x2007).contains(&addr));
            self.reads.push(addr);
            (addr & 0xFF) as u8
        }

        fn write_register(&mut self, addr: u16, value: u8) {
            assert!((0x2000..=0x2007).contains(&addr));
            self.writes.push((addr, value));
        }
    }

    fn setup_bus(prg_rom: Vec<u8>) -> NesBus<RegisterFile> {
        let mut bus = NesBus::new(RegisterFile::new());
        bus.install_program(&prg_rom);
        bus
    }

    #[test]
    fn test_cpu_ram_read_write() {
        let mut bus = setup_bus(vec![0; 0x8000]);

        bus.write_byte(0x0004, 0x42);
        assert_eq!(bus.read_byte(0x0004), 0x42);
    }

    #[test]
    fn test_cpu_ram_mirroring() {
        let mut bus = setup_bus(vec![0; 0x8000]);

        bus.write_byte(0x0005, 0xAB);
        for addr in [0x0005, 0x0805, 0x1005, 0x1805] {
            assert_eq!(bus.read_byte(addr), 0xAB, "read at ${:04X}", addr);
        }

        // Writes through a mirror land in the same cell
        bus.write_byte(0x1FFF, 0x11);
        assert_eq!(bus.read_byte(0x07FF), 0x11);
    }

    #[test]
    fn test_ppu_register_mirroring() {
        let mut bus = NesBus::new(RecordingPpu::default());

        bus.write_byte(0x2000, 1);
        bus.write_byte(0x2008, 2);
        bus.write_byte(0x2010, 3);
        bus.write_byte(0x3FFF, 4);
        bus.read_byte(0x2000);
        bus.read_byte(0x2008);
        bus.read_byte(0x3FF8);

        assert_eq!(
            bus.ppu().writes,
            vec![(0x2000, 1), (0x2000, 2), (0x2000, 3), (0x2007, 4)]
        );
        assert_eq!(bus.ppu().reads, vec![0x2000, 0x2000, 0x2000]);
    }

    #[test]
    fn test_register_file_through_bus() {
        let mut bus = setup_bus(vec![0; 0x4000]);

        // $2006 mirrored at $200E and $3FFE
        bus.write_byte(0x200E, 0x23);
        bus.write_byte(0x3FFE, 0x45);
        assert_eq!(bus.ppu().vram_addr(), 0x2345);
    }

    #[test]
    fn test_apu_io_window() {
        let mut bus = setup_bus(vec![0; 0x4000]);

        bus.write_byte(0x4000, 0x10);
        bus.write_byte(0x401F, 0x20);
        assert_eq!(bus.read_byte(0x4000), 0x10);
        assert_eq!(bus.read_byte(0x401F), 0x20);
        assert_eq!(decode(0x4015), (Region::ApuIo, 0x15));
    }

    #[test]
    fn test_expansion_region() {
        let mut bus = setup_bus(vec![0; 0x4000]);

        bus.write_byte(0x4020, 0x01);
        bus.write_byte(0x6000, 0x02);
        bus.write_byte(0x7FFF, 0x03);
        assert_eq!(bus.read_byte(0x4020), 0x01);
        assert_eq!(bus.read_byte(0x6000), 0x02);
        assert_eq!(bus.read_byte(0x7FFF), 0x03);
        assert_eq!(decode(0x7FFF), (Region::Expansion, 0x3FDF));
    }

    #[test]
    fn test_decode_is_total() {
        for addr in 0..=u16::MAX {
            let (region, offset) = decode(addr);
            let (start, size) = match region {
                Region::CpuRam => (0x0000, 0x0800),
                Region::PpuRegisters => {
                    assert!((0x2000..0x2008).contains(&offset), "${:04X}", addr);
                    continue;
                }
                Region::ApuIo => (0x4000, 0x20),
                Region::Expansion => (0x4020, 0x3FE0),
                Region::PrgLower => (0x8000, 0x4000),
                Region::PrgUpper => (0xC000, 0x4000),
            };
            assert!(offset < size, "${:04X} -> {:?} + {}", addr, region, offset);
            assert!(addr as usize >= start);
        }
    }

    #[test]
    fn test_small_prg_rom_mirrors_upper_bank() {
        let prg: Vec<u8> = (0..0x4000).map(|i| (i % 251) as u8).collect();
        let mut bus = setup_bus(prg);

        assert!(bus.prg_mirrored());
        for offset in 0..0x4000u16 {
            assert_eq!(
                bus.read_byte(0x8000 + offset),
                bus.read_byte(0xC000 + offset)
            );
        }
    }

    #[test]
    fn test_tiny_prg_rom_is_padded_and_mirrored() {
        let mut bus = setup_bus(vec![0xEA; 0x100]);

        assert_eq!(bus.read_byte(0x8000), 0xEA);
        assert_eq!(bus.read_byte(0xC0FF), 0xEA);
        assert_eq!(bus.read_byte(0x8100), 0x00);
    }

    #[test]
    fn test_full_prg_rom_banks_are_independent() {
        let mut prg = vec![0x11; 0x4000];
        prg.extend(vec![0x22; 0x4000]);
        let mut bus = setup_bus(prg);

        assert!(!bus.prg_mirrored());
        assert_eq!(bus.read_byte(0x8000), 0x11);
        assert_eq!(bus.read_byte(0xBFFF), 0x11);
        assert_eq!(bus.read_byte(0xC000), 0x22);
        assert_eq!(bus.read_byte(0xFFFF), 0x22);
    }

    #[test]
    fn test_prg_rom_beyond_32k_is_dropped() {
        let mut prg = vec![0x11; 0x4000];
        prg.extend(vec![0x22; 0x4000]);
        prg.extend(vec![0x33; 0x4000]);
        let mut bus = setup_bus(prg);

        assert_eq!(bus.read_byte(0xFFFF), 0x22);
    }

    #[test]
    fn test_prg_rom_between_16k_and_32k_pads_upper_bank() {
        let mut prg = vec![0x11; 0x4000];
        prg.extend(vec![0x22; 0x10]);
        let mut bus = setup_bus(prg);

        assert!(!bus.prg_mirrored());
        assert_eq!(bus.read_byte(0xC00F), 0x22);
        assert_eq!(bus.read_byte(0xC010), 0x00);
    }

    #[test]
    #[should_panic(expected = "empty image")]
    fn test_install_empty_program_is_fatal() {
        let mut bus = NesBus::new(RegisterFile::new());
        bus.install_program(&[]);
    }

    #[test]
    fn test_rom_write_is_ignored() {
        let mut bus = setup_bus(vec![0xAA; 0x8000]);

        bus.write_byte(0x8000, 0x12);
        bus.write_byte(0xC000, 0x34);
        assert_eq!(bus.read_byte(0x8000), 0xAA);
        assert_eq!(bus.read_byte(0xC000), 0xAA);
    }

    #[test]
    fn test_read_word_little_endian() {
        let mut bus = setup_bus(vec![0; 0x4000]);

        bus.write_byte(0x0010, 0x34);
        bus.write_byte(0x0011, 0x12);
        assert_eq!(bus.read_word(0x0010), 0x1234);

        // Word straddling a RAM mirror boundary
        bus.write_byte(0x07FF, 0xCD);
        bus.write_byte(0x0000, 0xAB);
        assert_eq!(bus.read_word(0x07FF), 0xABCD);
    }

    #[test]
    fn test_write_word_round_trips_in_ram() {
        let mut bus = setup_bus(vec![0; 0x4000]);

        bus.write_word(0x0200, 0xBEEF);
        assert_eq!(bus.read_byte(0x0200), 0xEF);
        assert_eq!(bus.read_byte(0x0201), 0xBE);
        assert_eq!(bus.read_word(0x0A00), 0xBEEF);
    }

    #[test]
    fn test_write_word_writes_low_byte_first() {
        let mut bus = NesBus::new(RecordingPpu::default());

        bus.write_word(0x2005, 0x1234);
        assert_eq!(bus.ppu().writes, vec![(0x2005, 0x34), (0x2006, 0x12)]);

        // $2007 + 1 folds back onto $2000
        bus.write_word(0x2007, 0xABCD);
        assert_eq!(bus.ppu().writes[2..], [(0x2007, 0xCD), (0x2000, 0xAB)]);
    }

    #[test]
    fn test_reset_vector_from_upper_bank() {
        let mut prg = vec![0; 0x8000];
        prg[0x7FFC] = 0x00;
        prg[0x7FFD] = 0x80;
        let mut bus = setup_bus(prg);

        assert_eq!(bus.read_word(0xFFFC), 0x8000);
    }

    #[test]
    fn test_read_word_wraps_at_top_of_address_space() {
        let mut prg = vec![0; 0x8000];
        prg[0x7FFF] = 0x12;
        let mut bus = setup_bus(prg);
        bus.write_byte(0x0000, 0x34);

        assert_eq!(bus.read_word(0xFFFF), 0x3412);
    }

    #[test]
    fn test_trace_hook_sees_resolved_accesses() {
        let mut bus = setup_bus(vec![0x5A; 0x4000]);
        let events: Rc<RefCell<Vec<BusEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        bus.set_trace_hook(Box::new(move |event: &BusEvent| sink.borrow_mut().push(*event)));

        bus.write_byte(0x0805, 0xAB);
        bus.read_byte(0xC001);

        let seen = events.borrow();
        assert_eq!(
            *seen,
            vec![
                BusEvent {
                    access: Access::Write,
                    addr: 0x0805,
                    region: Region::CpuRam,
                    offset: 0x0005,
                    value: 0xAB,
                },
                BusEvent {
                    access: Access::Read,
                    addr: 0xC001,
                    region: Region::PrgUpper,
                    offset: 0x0001,
                    value: 0x5A,
                },
            ]
        );
    }

    #[test]
    fn test_clear_trace_hook_stops_events() {
        let mut bus = setup_bus(vec![0; 0x4000]);
        let count = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&count);
        bus.set_trace_hook(Box::new(move |_: &BusEvent| *sink.borrow_mut() += 1));

        bus.read_byte(0x0000);
        bus.clear_trace_hook();
        bus.read_byte(0x0000);

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_peek_has_no_side_effects() {
        let mut bus = NesBus::new(RecordingPpu::default());
        bus.install_program(&[0x99; 0x10]);
        bus.write_byte(0x0001, 0x77);

        assert_eq!(bus.peek(0x0801), Some(0x77));
        assert_eq!(bus.peek(0xC000), Some(0x99));
        assert_eq!(bus.peek(0x2002), None);
        assert!(bus.ppu().reads.is_empty());
    }

    #[test]
    fn test_reset_keeps_program() {
        let mut bus = setup_bus(vec![0x42; 0x4000]);
        bus.write_byte(0x0000, 0x01);
        bus.write_byte(0x6000, 0x02);

        bus.reset();

        assert_eq!(bus.read_byte(0x0000), 0);
        assert_eq!(bus.read_byte(0x6000), 0);
        assert_eq!(bus.read_byte(0x8000), 0x42);
    }
}
