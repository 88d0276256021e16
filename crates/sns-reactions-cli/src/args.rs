use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use sns_reactions_engine::{GenerationMode, Platform};

#[derive(Parser, Debug)]
#[command(name = "sns-reactions-cli")]
#[command(about = "Parse, page and re-serialize generated social-feed markup")]
#[command(version)]
#[command(after_help = "<FILE> may be '-' to read standard input.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Parse markup and print the posts as JSON
    Parse {
        input: PathBuf,

        /// Platform to tag the parsed page with
        #[arg(long, value_enum, ignore_case = true)]
        platform: Option<PlatformArg>,
    },
    /// Write a JSON page back as markup
    Serialize {
        input: PathBuf,

        /// Dialect to write (defaults to the configured platform)
        #[arg(long, value_enum, ignore_case = true)]
        platform: Option<PlatformArg>,
    },
    /// Add a generated page to a message in the store
    Append {
        message_id: String,
        input: PathBuf,

        #[arg(long, value_enum, ignore_case = true)]
        platform: Option<PlatformArg>,

        /// Replace the current page instead of adding a new one
        #[arg(long)]
        replace: bool,
    },
    /// Save edited markup over a message's current page
    Edit { message_id: String, input: PathBuf },
    /// Browse stored messages in the terminal
    View {
        /// Store file (defaults to the configured store path)
        store: Option<PathBuf>,
    },
    /// Write the default config file
    InitConfig,
}

impl Command {
    /// Whether the command takes over the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Command::View { .. })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformArg {
    Twitter,
    Instagram,
    Youtube,
    Everytime,
    Messenger,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Twitter => Platform::Twitter,
            PlatformArg::Instagram => Platform::Instagram,
            PlatformArg::Youtube => Platform::Youtube,
            PlatformArg::Everytime => Platform::Everytime,
            PlatformArg::Messenger => Platform::Messenger,
        }
    }
}

/// Generation mode selected by `--replace`.
pub fn generation_mode(replace: bool) -> GenerationMode {
    if replace {
        GenerationMode::Replace
    } else {
        GenerationMode::Append
    }
}
