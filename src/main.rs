use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::info;
use url::Url;

use mf2_authorship::config::Settings;
use mf2_authorship::{resolve_all, Document, HttpFetcher, PageFetcher};

#[derive(Parser)]
#[command(name = "microformats", about = "Microformats2 parser and authorship finder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Per-request timeout in seconds (overrides MF2_FETCH_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Entries resolved in parallel (overrides MF2_CONCURRENCY)
    #[arg(long, global = true)]
    concurrency: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page and print its parsed microformats
    Parse { url: String },
    /// Fetch a page and print it with the author of every h-entry resolved
    Author { url: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!("{}", one_line(&e.to_string()));
            return ExitCode::from(2);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let t0 = Instant::now();
    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(timeout) = cli.timeout {
        settings.fetch_timeout_secs = timeout;
    }
    if let Some(concurrency) = cli.concurrency {
        settings.concurrency = concurrency;
    }
    let fetcher = HttpFetcher::new(&settings).context("Failed to build HTTP client")?;

    let doc = match cli.command {
        Commands::Parse { url } => {
            let url = parse_url(&url)?;
            info!("Parsing {}", url);
            fetcher.fetch(&url).await?
        }
        Commands::Author { url } => {
            let url = parse_url(&url)?;
            info!("Finding authors on {}", url);
            let mut doc = fetcher.fetch(&url).await?;
            resolve_all(&mut doc, &url, &fetcher, settings.concurrency).await;
            doc
        }
    };

    print_document(&doc)?;
    info!("Done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(())
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).with_context(|| format!("invalid URL {:?}", raw))
}

fn print_document(doc: &Document) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, doc).context("Failed to encode document")?;
    writeln!(out)?;
    Ok(())
}

/// Collapse clap's multi-line message to its first paragraph.
fn one_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .take_while(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clap_errors_fit_on_one_line() {
        let err = Cli::try_parse_from(["microformats", "author"])
            .err()
            .unwrap();
        let line = one_line(&err.to_string());
        assert!(line.starts_with("error:"));
        assert!(!line.contains('\n'));
        assert!(line.contains("<URL>"));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "microformats",
            "parse",
            "http://example.com/",
            "--timeout",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.timeout, Some(3));
        assert!(matches!(cli.command, Commands::Parse { ref url } if url == "http://example.com/"));
    }

    #[test]
    fn rejects_relative_urls() {
        assert!(parse_url("/just/a/path").is_err());
        assert!(parse_url("http://example.com/post").is_ok());
    }
}
