// Copyright 2026 JobScout Contributors
// SPDX-License-Identifier: Apache-2.0

//! `jobscout` — drive a real browser through job search pages and serve the
//! listings as JSON.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use jobscout_runtime::cli;
use jobscout_runtime::config::{BrowserArgs, ServeArgs};

#[derive(Parser)]
#[command(
    name = "jobscout",
    about = "JobScout — scrape job listings through a real browser",
    version,
    after_help = "Run 'jobscout <command> --help' for details on each command.\nRun 'jobscout' with no command to start the HTTP API."
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API (default)
    Serve(ServeArgs),
    /// Scrape one URL and print the result as JSON
    Scrape {
        /// Search or feed page to scrape
        url: String,
        /// Maximum number of listings to return
        #[arg(long)]
        max_jobs: Option<usize>,
        #[command(flatten)]
        browser: BrowserArgs,
    },
    /// Check environment and diagnose issues
    Doctor {
        #[command(flatten)]
        browser: BrowserArgs,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => cli::serve::run(args).await,
        Commands::Scrape {
            url,
            max_jobs,
            browser,
        } => cli::scrape_cmd::run(&url, max_jobs, &browser).await,
        Commands::Doctor { browser } => cli::doctor::run(&browser).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "jobscout", &mut std::io::stdout());
            Ok(())
        }
    }
}
