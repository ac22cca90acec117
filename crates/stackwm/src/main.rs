mod config;
mod dispatch;
mod focus;
mod geometry;
mod ipc;
mod layout;
mod registry;
mod resize;
mod spawn;
mod state;
mod status;
#[cfg(test)]
mod testing;
mod window_system;
mod workspace;
mod x11;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use stackwm_common::FileLogger;

use config::Config;
use dispatch::Dispatcher;
use ipc::IpcServer;
use spawn::CommandSpawner;
use status::{NullStatusBar, StatusBar};
use x11::X11WindowSystem;

/// A small master/stack tiling window manager for X11.
#[derive(Parser, Debug)]
#[command(name = "stackwm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file. Defaults to the user config, then
    /// /etc/stackwm/config.toml.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Parse the configuration, print the resulting bindings and exit.
    #[arg(long)]
    check_config: bool,

    /// Log at trace level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.check_config {
        return check_config(cli.config.as_deref());
    }

    let level = if cli.verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    if let Err(e) = FileLogger::init(level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    log::info!("Starting stackwm {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(cli.config.as_deref());
    spawn::reap_children_automatically();

    let ws = match X11WindowSystem::connect() {
        Ok(ws) => ws,
        Err(e) => {
            log::error!("Cannot start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let status: Box<dyn StatusBar> = if config.status.ipc {
        match IpcServer::new() {
            Ok(server) => Box::new(server),
            Err(e) => {
                log::warn!("IPC disabled: {}", e);
                Box::new(NullStatusBar)
            }
        }
    } else {
        Box::new(NullStatusBar)
    };

    let mut dispatcher = Dispatcher::new(ws, &config, Box::new(CommandSpawner), status);

    if let Err(e) = dispatcher.setup() {
        log::error!("Failed to install grabs: {}", e);
        return ExitCode::FAILURE;
    }

    match dispatcher.run() {
        Ok(()) => {
            log::info!("stackwm exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Display connection lost: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn check_config(path: Option<&Path>) -> ExitCode {
    let candidates = Config::candidates(path);

    let config = match candidates.iter().find(|p| p.exists()) {
        Some(p) => match Config::load_from_path(p) {
            Ok(config) => {
                println!("{}: ok", p.display());
                config
            }
            Err(e) => {
                eprintln!("{}: {}", p.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None if path.is_some() => {
            eprintln!("{}: not found", candidates[0].display());
            return ExitCode::FAILURE;
        }
        None => {
            println!("No config file found, using defaults");
            Config::default()
        }
    };

    let bindings = config.keybinds.get_all_bindings();
    if bindings.len() < config.keybinds.bind.len() {
        eprintln!(
            "{} of {} bindings are invalid",
            config.keybinds.bind.len() - bindings.len(),
            config.keybinds.bind.len()
        );
    }
    for (keybind, action) in &bindings {
        println!("{:?} keysym {:#x} => {:?}", keybind.modifiers, keybind.keysym, action);
    }
    println!(
        "gap {} bar {} master ratio {} workspaces {} max clients {}",
        config.gap(),
        config.bar_height(),
        config.layout.master_ratio,
        config.layout.workspaces,
        config.max_clients()
    );

    ExitCode::SUCCESS
}
