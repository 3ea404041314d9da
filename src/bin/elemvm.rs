#[macro_use]
extern crate log;

use clap::{App, Arg, ArgMatches};
use elemvm::asm;
use elemvm::config::Config;
use elemvm::container;
use elemvm::vm::VM;
use std::env;
use std::error::Error;
use std::fs::{self, File};
use std::io::{stdout, BufWriter};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() {
    let matches = App::new("elemvm")
        .about("Assembles and runs stack machine programs")
        .arg(Arg::with_name("FILE")
            .help("Source file or precompiled image")
            .required(true))
        .arg(Arg::with_name("debug")
            .short("d")
            .long("debug")
            .help("Enable debug messages and print the program"))
        .arg(Arg::with_name("compile")
            .short("c")
            .long("compile")
            .requires("output")
            .help("Write a precompiled image instead of running"))
        .arg(Arg::with_name("output")
            .short("o")
            .long("output")
            .takes_value(true)
            .value_name("OUT")
            .help("Image file to write with --compile"))
        .get_matches();

    match do_checked_main(&matches) {
        Ok(code) => process::exit(code),
        Err(e) => {
            println!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn do_checked_main(matches: &ArgMatches) -> Result<i32, Box<dyn Error>> {
    let debug = matches.is_present("debug");
    if debug {
        env::set_var("RUST_LOG", "elemvm=debug");
    }
    let _ = env_logger::try_init();

    let filename = matches.value_of("FILE").ok_or("missing FILE")?;
    let program = container::load(fs::read(filename)?)?;

    if debug {
        println!("{}", hex::encode(&program));
        println!("{}", program.len());
        for line in asm::disassemble(&program)? {
            println!("{}", line);
        }
    }

    if matches.is_present("compile") {
        let out = matches.value_of("output").ok_or("missing --output")?;
        let mut file = BufWriter::new(File::create(out)?);
        container::write_image(&mut file, &program)?;
        info!("wrote {} bytes to {}", program.len() + container::MAGIC.len(), out);
        return Ok(0);
    }

    let termination_scheduled = Arc::new(AtomicBool::new(false));
    let r = termination_scheduled.clone();
    ctrlc::set_handler(move || {
        info!("Terminating...");
        r.store(true, Ordering::Relaxed);
    })?;

    let config = Config {
        trace: debug,
        ..Config::default()
    };

    let stdout = stdout();
    let mut vm = VM::with_config(stdout.lock(), program, config);
    vm.set_termination_flag(termination_scheduled);

    match vm.run() {
        Ok(code) => Ok(i32::from(code)),
        Err(fatal) => {
            eprintln!("fatal: {}", fatal);
            process::abort();
        }
    }
}
