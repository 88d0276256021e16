mod args;
mod commands;
mod render;
mod viewer;

use anyhow::Result;
use args::{Cli, Command, generation_mode};
use clap::Parser;
use sns_reactions_config::Config;
use std::process;

fn main() -> Result<()> {
    let command = Cli::parse().command;

    // Keep the terminal viewer's screen free of routine log lines
    let level = if command.is_interactive() {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config = match Config::load() {
        Ok(Some(config)) => {
            log::info!("Loaded config from {}", Config::config_path().display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    match command {
        Command::Parse { input, platform } => {
            println!("{}", commands::parse_command(&input, platform.map(Into::into))?);
        }
        Command::Serialize { input, platform } => {
            let platform = commands::resolve_platform(platform.map(Into::into), &config);
            println!("{}", commands::serialize_command(&input, platform)?);
        }
        Command::Append {
            message_id,
            input,
            platform,
            replace,
        } => {
            let platform = commands::resolve_platform(platform.map(Into::into), &config);
            let service = commands::open_service(None, &config);
            println!(
                "{}",
                commands::append_command(
                    &service,
                    &message_id,
                    &input,
                    platform,
                    generation_mode(replace),
                    config.max_posts
                )?
            );
        }
        Command::Edit { message_id, input } => {
            let service = commands::open_service(None, &config);
            println!(
                "{}",
                commands::edit_command(&service, &message_id, &input)?
            );
        }
        Command::View { store } => {
            viewer::run(commands::open_service(store, &config))?;
        }
        Command::InitConfig => {
            let path = Config::config_path();
            if path.exists() {
                eprintln!("Error: Config file already exists at {}", path.display());
                process::exit(1);
            }
            config.save()?;
            println!("Wrote default config to {}", path.display());
        }
    }

    Ok(())
}
