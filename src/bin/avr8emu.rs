//
// avr8emu.rs --- Emulator tool entry point.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

use std::env;
use std::process::exit;

use getopts::Options;
use log::{warn, LevelFilter};

use avr8::emu::{DataMemory, Error, Firmware, Port, Result, CPU};

fn print_usage(opts: Options) {
    let brief = "Usage: avr8emu [OPTIONS...] FILE...";
    print!("{}", opts.usage(brief));
}

/// Parse and validate command line options, returning the `Matches`
/// object containing option information.
fn parse_options() -> getopts::Matches {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::new();

    opts.optopt("e", "entry", "entry point address (default: reset vector at 00)", "ADDR");
    opts.optopt("u", "until", "run until this PC", "ADDR");
    opts.optopt("n", "steps", "instructions to run without --until (default: 20)", "N");
    opts.optopt("", "limit", "most instructions --until may run (default: 100000)", "N");
    opts.optopt("s", "symbols", "read subroutine names from FILE", "FILE");
    opts.optmulti("p", "pin", "drive the input pins of a port, e.g. B=20", "PORT=HEX");
    opts.optflagmulti("v", "verbose", "log each instruction; twice to log each tick");
    opts.optflag("", "help", "display this help and exit");
    opts.optflag("", "version", "output version information and exit");

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => { m },
        Err(f) => {
            println!("avr8emu: {}\n", f);
            print_usage(opts);
            exit(1);
        },
    };

    if matches.opt_present("help") {
        print_usage(opts);
        exit(0);
    }

    if matches.opt_present("version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        exit(0);
    }

    if matches.free.is_empty() {
        println!("avr8emu: no input files\n");
        print_usage(opts);
        exit(1);
    }

    matches
}

fn init_logging(verbosity: usize) {
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Parse a `PORT=HEX` pin setting.
fn parse_pin(arg: &str) -> Result<(Port, u8)> {
    let bad = || Error::Config(format!("bad pin setting '{}'", arg));

    let (port, val) = arg.split_once('=').ok_or_else(bad)?;
    let mut letters = port.chars();
    let port = match (letters.next(), letters.next()) {
        (Some(c), None) => Port::from_letter(c).ok_or_else(bad)?,
        _ => return Err(bad()),
    };

    Ok((port, u8::from_str_radix(val, 16)?))
}

fn run() -> Result<()> {
    let matches = parse_options();
    init_logging(matches.opt_count("v"));

    let mut firmware = Firmware::new();
    for infile in matches.free.iter() {
        firmware.load_ihex_file(infile)?;
    }
    if let Some(path) = matches.opt_str("s") {
        firmware.load_symbols_file(path)?;
    }

    let entry = match matches.opt_str("e") {
        Some(arg) => u8::from_str_radix(&arg, 16)?,
        None => 0,
    };
    let run_until = match matches.opt_str("u") {
        Some(arg) => Some(u8::from_str_radix(&arg, 16)?),
        None => None,
    };
    let steps = match matches.opt_str("n") {
        Some(arg) => arg.parse::<usize>()?,
        None => 20,
    };
    let limit = match matches.opt_str("limit") {
        Some(arg) => arg.parse::<usize>()?,
        None => 100_000,
    };

    let mut cpu = CPU::new(DataMemory::new(), firmware)?;
    cpu.regs.pc = entry;

    for arg in matches.opt_strs("p").iter() {
        let (port, val) = parse_pin(arg)?;
        cpu.set_pins(port, val);
    }

    match run_until {
        Some(addr) => {
            if !cpu.run_until(addr, limit) {
                warn!("gave up after {} instructions without reaching {:02X}", limit, addr);
            }
        },
        None => cpu.step_n(steps),
    }

    println!("{}", cpu.regs);
    println!("PC={:02X} SR={} in {}", cpu.pc(), cpu.status(),
             cpu.current_subroutine().unwrap_or("?"));

    Ok(())
}

fn main() {
    match run() {
        Ok(_) => (),
        Err(err) => {
            println!("avr8emu: {}", err);
            exit(1);
        }
    }
}
