mod age;
mod config;
mod error;
mod github;
mod languages;
mod models;
mod render;

use std::io::{self, BufRead, Write};

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use config::Config;
use error::{AppError, Result};
use github::GithubClient;
use languages::LanguageAggregator;
use render::{Report, Style};

const DEFAULT_LOG_FILTER: &str = "warn,lang_trace=info";
const LANG_TRACE_DIRECTIVE: &str = "lang_trace=info";

#[tokio::main]
async fn main() {
    let verbose = config::verbose_languages(|key| std::env::var(key).ok());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(with_lang_trace(filter, verbose))
        .with_writer(io::stderr)
        .init();

    let config = Config::from_env();

    // Every failure ends up here as one line; the exit status stays 0.
    if let Err(e) = run(&config).await {
        println!("Error: {e}");
    }
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let username = prompt_username(&mut io::stdin().lock(), &mut io::stdout())?;

    let client = GithubClient::new(config)?;
    if config.token.is_none() {
        info!("GITHUB_TOKEN not set, sending unauthenticated requests");
    }

    let profile = client.fetch_user(&username).await?;
    let listing = client.fetch_repos(&username).await?;
    if listing.truncated {
        warn!(
            username = %username,
            "repository list is capped at one page; older repositories are not counted"
        );
    }

    let languages = LanguageAggregator::new(&client)
        .verbose(config.verbose_languages)
        .aggregate(&listing.repos)
        .await;

    let report = Report {
        profile: &profile,
        listing: &listing,
        languages: &languages,
        today: Utc::now().date_naive(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match config.style {
        Style::Plain => render::render_plain(&mut out, &report)?,
        Style::Dashboard => render::render_dashboard(&mut out, &report, config.theme)?,
    }
    out.flush()?;

    Ok(())
}

/// Let `VERBOSE_LANG=1` through even when `RUST_LOG` would filter the
/// aggregator's trace out.
fn with_lang_trace(filter: EnvFilter, verbose: bool) -> EnvFilter {
    if !verbose {
        return filter;
    }
    match LANG_TRACE_DIRECTIVE.parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Ask for a username on `output` and read one line from `input`.
fn prompt_username<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    write!(output, "Enter GitHub username: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let username = line.trim();
    if username.is_empty() {
        return Err(AppError::EmptyInput);
    }
    Ok(username.to_string())
}
