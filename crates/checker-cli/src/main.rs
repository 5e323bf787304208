use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

use commands::Overrides;

#[derive(Parser)]
#[command(
    name = "checkerctl",
    about = "Checker state and flag tool for attack-defense competitions",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to checker.toml. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Override [backend].path.
    #[arg(long, global = true)]
    backend_root: Option<String>,
    /// Override [competition].start_time (Unix seconds).
    #[arg(long, global = true)]
    start_time: Option<u64>,
    /// Override [competition].tick_duration, e.g. "60s".
    #[arg(long, global = true)]
    tick_duration: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive or verify flags
    Flag {
        #[command(subcommand)]
        action: FlagAction,
    },
    /// Store or read YAML metadata records
    Meta {
        #[command(subcommand)]
        action: MetaAction,
    },
    /// Store or read raw blob records
    Blob {
        #[command(subcommand)]
        action: BlobAction,
    },
    /// Print the conventional identifier for a tick and purpose
    Ident {
        #[arg(long)]
        team: u32,
        #[arg(long)]
        service: u32,
        #[arg(long)]
        tick: u64,
        #[arg(long)]
        purpose: String,
    },
    /// Write a scaffold checker.toml.
    ///
    /// --backend-root and --start-time fill in the matching fields.
    Init {
        /// Directory to write checker.toml into
        #[arg(short, long, default_value = ".")]
        path: String,
    },
}

#[derive(Subcommand)]
enum FlagAction {
    /// Compute the flag for a tick
    Derive {
        #[arg(long)]
        team: u32,
        #[arg(long)]
        service: u32,
        #[arg(long)]
        tick: u64,
        /// Hex-encoded payload, at most 8 bytes
        #[arg(long)]
        payload: Option<String>,
    },
    /// Authenticate a flag and print its fields
    Verify {
        token: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
enum MetaAction {
    /// Store a YAML file as the metadata record for an identifier
    Put {
        #[arg(long)]
        id: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Print the metadata record for an identifier as YAML
    Get {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum BlobAction {
    /// Store a file's bytes as the blob record for an identifier
    Put {
        #[arg(long)]
        id: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Read the blob record for an identifier
    Get {
        #[arg(long)]
        id: String,
        /// Write the blob here instead of printing it as hex
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("checkerctl=info".parse()?)
        )
        .init();

    let cli = Cli::parse();
    let overrides = Overrides {
        backend_root: cli.global.backend_root,
        start_time: cli.global.start_time,
        tick_duration: cli.global.tick_duration,
    };
    let config_path = cli.global.config.as_deref();

    match cli.command {
        Commands::Flag { action } => {
            let config = commands::load_config(config_path, &overrides)?;
            match action {
                FlagAction::Derive { team, service, tick, payload } => {
                    commands::flag::derive(&config, team, service, tick, payload.as_deref())
                }
                FlagAction::Verify { token, format } => {
                    commands::flag::verify(&config, &token, &format)
                }
            }
        }
        Commands::Meta { action } => {
            let config = commands::load_config(config_path, &overrides)?;
            match action {
                MetaAction::Put { id, file } => commands::record::meta_put(&config, &id, &file),
                MetaAction::Get { id } => commands::record::meta_get(&config, &id),
            }
        }
        Commands::Blob { action } => {
            let config = commands::load_config(config_path, &overrides)?;
            match action {
                BlobAction::Put { id, file } => commands::record::blob_put(&config, &id, &file),
                BlobAction::Get { id, out } => {
                    commands::record::blob_get(&config, &id, out.as_deref())
                }
            }
        }
        Commands::Ident { team, service, tick, purpose } => {
            commands::record::ident(team, service, tick, &purpose)
        }
        Commands::Init { path } => commands::init(&path, &overrides),
    }
}
