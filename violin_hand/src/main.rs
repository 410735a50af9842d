//! violin_hand — interactive entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use violin_hand::app::{run, RunOptions, SourceMode};
use violin_hand::config::Config;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Violin Hand — gesture-controlled virtual violin       ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut config_path = PathBuf::from("config/default_config.json");
    let mut options = RunOptions::default();
    let mut source_chosen = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => match args.next() {
                Some(path) => config_path = PathBuf::from(path),
                None => return usage("--config needs a path"),
            },
            "--tracker" => match args.next() {
                Some(cmd) => {
                    options.source = SourceMode::Tracker(cmd);
                    source_chosen = true;
                }
                None => return usage("--tracker needs a command"),
            },
            "--sim" => {
                options.source = SourceMode::Sim;
                source_chosen = true;
            }
            "--no-midi" => options.use_midi = false,
            "--no-log" => options.use_log = false,
            "--help" | "-h" => return usage(""),
            other => return usage(&format!("unknown flag: {}", other)),
        }
    }

    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    // A tracker command in the config applies unless a mode was given
    if !source_chosen {
        if let Some(command) = config.tracker.command.take() {
            options.source = SourceMode::Tracker(command);
        }
    }

    match &options.source {
        SourceMode::Sim => println!("  Mode: keyboard simulation  (use --tracker <cmd> for a camera)"),
        SourceMode::Tracker(cmd) => println!("  Mode: external tracker `{}`", cmd),
    }
    println!();

    if let Err(e) = run(config, options) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn usage(problem: &str) -> ExitCode {
    if !problem.is_empty() {
        eprintln!("Error: {}", problem);
        eprintln!();
    }
    eprintln!("Usage: violin_hand [OPTIONS]");
    eprintln!();
    eprintln!("  -c, --config <path>   JSON config file (default config/default_config.json)");
    eprintln!("      --tracker <cmd>   stream landmarks from an external tracker command");
    eprintln!("      --sim             keyboard simulation (default)");
    eprintln!("      --no-midi         disable MIDI output");
    eprintln!("      --no-log          disable session logging");
    eprintln!("  -h, --help            show this help");
    if problem.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
