mod config;
mod deregister;
mod entry;
mod gsettings;
mod keybinding_list;
mod lifecycle;
mod register;
mod status;
mod store;
mod tools;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{InstallPaths, LifecycleConfig};
use gsettings::GSettings;
use lifecycle::{Harness, InstallOptions, Report, UninstallOptions};
use std::path::PathBuf;
use store::{ConfigStore, DryRunStore};

#[derive(Parser, Debug)]
#[command(name = "klipbored-lifecycle", version, about = "Install and uninstall klipBored")]
struct Cli {
    #[arg(long, global = true, env = "KLIPBORED_LIFECYCLE_CONFIG", help = "TOML file overriding the built-in settings")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Log what would change without changing anything")]
    dry_run: bool,
    #[arg(long, global = true, help = "Do not run icon and desktop database refresh tools")]
    no_refresh: bool,
    #[arg(long, short = 'v', global = true, help = "Enable debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install files for the current user and register the shortcut
    Install {
        #[arg(long, help = "Application binary to install")]
        binary: Option<PathBuf>,
        #[arg(long, help = "SVG icon to install")]
        icon: Option<PathBuf>,
        #[arg(long, help = "Key chord, e.g. <Super>v")]
        binding: Option<String>,
        #[arg(long, help = "Start the application on login")]
        autostart: bool,
    },
    /// Remove the shortcut, user configuration and installed files
    Uninstall {
        #[arg(long, help = "Leave an installed system package alone")]
        keep_package: bool,
    },
    /// Only register the custom shortcut
    Register {
        #[arg(long, help = "Command the shortcut runs (defaults to the installed binary)")]
        command: Option<String>,
        #[arg(long, help = "Key chord, e.g. <Super>v")]
        binding: Option<String>,
    },
    /// Only remove the custom shortcut
    Deregister,
    /// Show the registered shortcut
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();

    let config = LifecycleConfig::load(cli.config.as_deref())?;
    log::debug!("Config loaded: {:?}", config);

    let paths = InstallPaths::for_current_user(&config.desktop)?;
    let store = open_store(cli.dry_run);

    match cli.command {
        Command::Install {
            binary,
            icon,
            binding,
            autostart,
        } => {
            let options = InstallOptions {
                binary,
                icon,
                binding,
                autostart,
            };
            let report = Harness::new(&config, paths, store)
                .dry_run(cli.dry_run)
                .refresh_caches(!cli.no_refresh)
                .install(&options);
            finish(&report)
        }
        Command::Uninstall { keep_package } => {
            let report = Harness::new(&config, paths, store)
                .dry_run(cli.dry_run)
                .refresh_caches(!cli.no_refresh)
                .uninstall(&UninstallOptions { keep_package });
            if let Some(deregistration) = &report.deregistration {
                println!("{}", deregistration.status_line(cli.dry_run));
            }
            finish(&report)
        }
        Command::Register { command, binding } => {
            let mut store = store.context("gsettings is required to register a shortcut")?;
            let command = command.unwrap_or_else(|| paths.binary.to_string_lossy().into_owned());
            let binding = binding.unwrap_or_else(|| config.keybinding.binding.clone());
            let registration = register::register(&mut store, &config.keybinding, &command, &binding)?;
            let how = if registration.created { "Registered" } else { "Updated" };
            println!("{} {} at {}", how, binding, registration.slot);
            Ok(())
        }
        Command::Deregister => {
            let Some(mut store) = store else {
                log::warn!("gsettings not available, skipping keybinding removal");
                println!("{}", deregister::Deregistration::NotFound.status_line(cli.dry_run));
                return Ok(());
            };
            let result = deregister::deregister(&mut store, &config.keybinding);
            println!("{}", result.status_line(cli.dry_run));
            Ok(())
        }
        Command::Status => {
            let store = store.context("gsettings is required to read shortcuts")?;
            println!("{}", status::status(&store, &config.keybinding));
            Ok(())
        }
    }
}

/// The session's settings store, or `None` when gsettings is absent
fn open_store(dry_run: bool) -> Option<Box<dyn ConfigStore>> {
    match GSettings::new() {
        Ok(store) if dry_run => Some(Box::new(DryRunStore::new(store))),
        Ok(store) => Some(Box::new(store)),
        Err(e) => {
            log::warn!("{}", e);
            None
        }
    }
}

fn finish(report: &Report) -> Result<()> {
    for step in &report.steps {
        log::debug!("{}", step);
    }
    if report.succeeded() {
        Ok(())
    } else {
        anyhow::bail!("Some installed files could not be removed")
    }
}
