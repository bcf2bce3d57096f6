//! Pagedrain command-line shell
//!
//! Thin shell that wires configuration, logging and output around the
//! browser driver. Scrolling logic lives in `crates/pagedrain-browser`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pagedrain_browser::{BrowserEngine, FetchRequest, PageAction};
use pagedrain_core::AppConfig;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Load infinite-scroll pages to the end and print the rendered HTML
#[derive(Parser, Debug)]
#[command(name = "pagedrain")]
#[command(version)]
#[command(about = "Scroll a page until no more content loads, then print its HTML", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a URL, exhaust its scrolling and print the final document
    Fetch(FetchArgs),
    /// Print the effective configuration
    Config {
        /// Print the config file location instead of its contents
        #[arg(long)]
        path: bool,
    },
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Page to load
    url: String,

    /// Stop after this many growth iterations
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// CSS selector of a "load more" control to click instead of scrolling
    #[arg(long, value_name = "CSS")]
    selector: Option<String>,

    /// JSON action list to run instead of the default scroll,
    /// e.g. '[{"click":{"element":"#accept"}},{"scroll":{}}]'
    #[arg(long, value_name = "JSON", conflicts_with_all = ["max_pages", "selector"])]
    actions: Option<String>,

    /// Write the HTML here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print each scroll outcome as JSON on stderr
    #[arg(long)]
    outcome_json: bool,

    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

impl FetchArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(pages) = self.max_pages {
            config.scroll.max_pages = Some(pages);
        }
        if let Some(selector) = &self.selector {
            config.scroll.control_selector = Some(selector.clone());
        }
        if self.headed {
            config.browser.headless = false;
        }
    }

    fn request(&self, config: &AppConfig) -> Result<FetchRequest> {
        match &self.actions {
            Some(json) => {
                let actions = PageAction::parse_list(json).context("parsing --actions")?;
                Ok(actions
                    .into_iter()
                    .fold(FetchRequest::new(&self.url), FetchRequest::with_action))
            }
            None => Ok(FetchRequest::scrolled(&self.url, config.scroll.clone())),
        }
    }
}

/// Initialize tracing subscriber for logging
///
/// Logs go to stderr so stdout carries only the document.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = match verbose {
        0 => "warn,pagedrain=info",
        1 => "info,pagedrain=debug",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load the config file and apply `PAGEDRAIN_*` overrides on top of it.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from_with_env(path),
        None => AppConfig::load_with_env(),
    };
    config.context("loading configuration")
}

async fn fetch(mut config: AppConfig, args: FetchArgs) -> Result<()> {
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;
    let request = args.request(&config)?;

    let engine = BrowserEngine::launch(&config.browser)
        .await
        .context("launching browser")?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling scroll session");
            interrupt.cancel();
        }
    });

    let result = engine.fetch(&request, &cancel).await;
    if let Err(e) = engine.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }
    let page = result.with_context(|| format!("fetching {}", request.url))?;

    for outcome in &page.outcomes {
        if args.outcome_json {
            eprintln!("{}", serde_json::to_string(outcome)?);
        } else {
            info!(
                "Scroll finished ({}): {} pages in {} iterations, {} ms",
                outcome.reason, outcome.pages_visited, outcome.iterations, outcome.elapsed_ms
            );
        }
    }

    match &args.output {
        Some(path) => std::fs::write(path, &page.html)
            .with_context(|| format!("writing {}", path.display()))?,
        None => std::io::stdout()
            .lock()
            .write_all(page.html.as_bytes())
            .context("writing to stdout")?,
    }
    Ok(())
}

fn show_config(config: &AppConfig, explicit: Option<&Path>, path_only: bool) -> Result<()> {
    if path_only {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => AppConfig::config_path()?,
        };
        println!("{}", path.display());
    } else {
        print!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Fetch(args) => fetch(config, args).await,
        Command::Config { path } => show_config(&config, cli.config.as_deref(), path),
    }
}
