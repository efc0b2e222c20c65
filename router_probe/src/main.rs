//! # Router Probe
//!
//! Main entry point for the message channel scenario driver.

use router_probe::{ProbeConfig, ProbeRuntime, Scenario};
use std::env;
use std::path::PathBuf;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    let mut probe = ProbeRuntime::new(config);

    if let Err(e) = probe.run() {
        eprintln!("Probe failed: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<ProbeConfig, String> {
    let mut config = ProbeConfig::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" | "-s" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --scenario".to_string());
                }
                config.scenario = Scenario::parse(&args[i]).map_err(|e| e.to_string())?;
            }
            "--transcript" | "-t" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --transcript".to_string());
                }
                config.transcript = Some(PathBuf::from(&args[i]));
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --scenario <NAME>    Scenario to run: roundtrip (default),");
    eprintln!("                           tab-query, teardown");
    eprintln!("  -t, --transcript <FILE>  Also write the transcript to a file");
    eprintln!("  -v, --verbose            Include payload dumps in the transcript");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --scenario roundtrip --verbose", program);
    eprintln!("  {} --scenario tab-query --transcript probe.log", program);
}
