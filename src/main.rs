use std::{io, process::ExitCode};

use addrfog::Config;
use tracing::info;

fn print_help() {
    println!("addrfog v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("  addrfog [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help       Print this help message");
    println!("  -v, --version    Print version information");
    println!();
    println!("Reserves huge views of address space in this process, then waits for Enter.");
}

fn main() -> ExitCode {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "-v" | "--version" => {
                println!("addrfog {}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            _ => {
                eprintln!("error: unrecognized argument '{}'", arg);
                eprintln!("Run 'addrfog --help' for usage information.");
                return ExitCode::FAILURE;
            }
        }
    }

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::default();
    info!(?config, "reserving address space");

    let result = match addrfog::protect(&config) {
        Ok(result) => result,
        Err(error) => {
            println!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    println!("reserved: {} GB", result.total_reserved_bytes() >> 30);
    println!("press enter to exit...");

    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);

    ExitCode::SUCCESS
}
