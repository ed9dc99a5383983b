use std::env;
use std::process;

use log::error;
use nes_cartbus::nes::tracer::{self, TRACER, Tracer};
use nes_cartbus::prelude::*;

struct Options {
    rom_path: String,
    trace: bool,
    trace_lines: usize,
    peeks: Vec<u16>,
    verbose: bool,
}

fn parse_args() -> Options {
    let mut args = env::args().skip(1);
    let mut rom_path: Option<String> = None;
    let mut trace = false;
    let mut trace_lines: usize = 64;
    let mut peeks: Vec<u16> = Vec::new();
    let mut verbose = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-t" | "--trace" => {
                trace = true;
            }
            "-n" | "--trace-lines" => {
                let val = args.next().unwrap_or_default();
                trace_lines = parse_usize(&val, "trace-lines");
            }
            "-p" | "--peek" => {
                let val = args.next().unwrap_or_default();
                let addr = parse_usize(&val, "peek");
                if addr > u16::MAX as usize {
                    eprintln!("Peek address out of range: {val}");
                    print_usage_and_exit();
                }
                peeks.push(addr as u16);
            }
            "-v" | "--verbose" => {
                verbose = true;
            }
            "-h" | "--help" => print_usage_and_exit(),
            _ => {
                if rom_path.is_none() {
                    rom_path = Some(arg);
                } else {
                    eprintln!("Unexpected argument: {arg}");
                    print_usage_and_exit();
                }
            }
        }
    }

    let rom_path = rom_path.unwrap_or_else(|| {
        eprintln!("Missing ROM path.");
        print_usage_and_exit();
    });

    Options {
        rom_path,
        trace,
        trace_lines,
        peeks,
        verbose,
    }
}

fn parse_usize(value: &str, name: &str) -> usize {
    if value.starts_with("0x") || value.starts_with("0X") {
        usize::from_str_radix(&value[2..], 16).unwrap_or_else(|_| {
            eprintln!("Invalid hex {name}: {value}");
            print_usage_and_exit();
        })
    } else {
        value.parse::<usize>().unwrap_or_else(|_| {
            eprintln!("Invalid {name}: {value}");
            print_usage_and_exit();
        })
    }
}

fn print_usage_and_exit() -> ! {
    eprintln!("Usage: nes-inspect <rom_path> [options]");
    eprintln!("Options:");
    eprintln!("  -t, --trace                 Record bus accesses and print them");
    eprintln!("  -n, --trace-lines <count>   Trace history size (default: 64)");
    eprintln!("  -p, --peek <addr>           Read a byte through the bus (repeatable)");
    eprintln!("  -v, --verbose               Debug logging (overridden by RUST_LOG)");
    process::exit(2);
}

fn init_logging(verbose: bool) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let default_level = if verbose { "debug" } else { "warn" };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .init();
    }
    #[cfg(target_arch = "wasm32")]
    let _ = verbose;
}

fn main() {
    let options = parse_args();
    init_logging(options.verbose);

    let mut nes = NES::new(RegisterFile::new());
    let header = match nes.load_rom_file(&options.rom_path) {
        Ok(header) => header,
        Err(e) => {
            error!("Failed to load {}: {}", options.rom_path, e);
            eprintln!("Error loading ROM: {e}");
            process::exit(1);
        }
    };

    println!("{}", options.rom_path);
    println!("{header}");

    if options.trace {
        if let Ok(mut history) = TRACER.lock() {
            *history = Tracer::new(options.trace_lines);
            history.log(&header);
            history.log(nes.bus());
        }
        nes.bus_mut().set_trace_hook(tracer::global_hook());
    }

    println!();
    println!("NMI vector:       ${:04X}", nes.nmi_vector());
    println!("RESET vector:     ${:04X}", nes.reset_vector());
    println!("IRQ vector:       ${:04X}", nes.irq_vector());

    for addr in &options.peeks {
        let value = nes.bus_mut().read_byte(*addr);
        let (region, offset) = nes_cartbus::nes::bus::decode(*addr);
        println!(
            "${:04X} -> {:<7} ${:04X} = ${:02X}",
            addr,
            region.name(),
            offset,
            value
        );
    }

    if options.trace {
        nes.bus_mut().clear_trace_hook();
        println!();
        if let Ok(history) = TRACER.lock() {
            history.print();
        }
    }
}
