use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use gator::config::FileConfigStore;
use gator::session::Session;

#[derive(Parser, Debug)]
#[command(
    name = "gator",
    about = "Command-line RSS feed aggregator",
    after_help = "Run `gator help` for the list of commands."
)]
struct Args {
    /// Config file (defaults to ~/.gatorconfig.json)
    #[arg(long, env = "GATOR_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Command to run
    command: Option<String>,

    /// Arguments passed to the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

async fn run(args: Args) -> Result<()> {
    let config_path = match args.config {
        Some(path) => path,
        None => FileConfigStore::default_path()?,
    };
    let session = Session::load(FileConfigStore::new(&config_path)).map_err(|e| {
        anyhow::anyhow!("Failed to read config {}: {}", config_path.display(), e)
    })?;

    gator::app::run(
        session,
        args.command.as_deref(),
        &args.args,
        std::io::stdout(),
    )
    .await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("err: {}", e);
        std::process::exit(1);
    }
}
