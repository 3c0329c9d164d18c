mod export;
mod fetch;
mod filters;
mod records;
mod search;
use crate::export::export;
use crate::fetch::{fetch_issues_and_prs, fetch_reviews};
use crate::filters::{DateRange, authored_filter, reviewed_filter};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use gqlient::{Client, GRAPHQL_API_URL};
use patharg::OutputArg;
use std::num::NonZeroUsize;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MAX_PAGE_SIZE: usize = 100;

/// Export the public issues & pull requests a GitHub user authored or
/// reviewed within a date range as two CSV files
#[derive(Clone, Debug, Eq, Parser, PartialEq)]
#[command(version)]
struct Arguments {
    /// Earliest creation date of items to export
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    from: NaiveDate,

    /// Latest creation date of items to export (inclusive)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    to: NaiveDate,

    /// Only export reviewed items in repositories belonging to this user or
    /// organization
    #[arg(long, value_name = "OWNER")]
    review_owner: Option<String>,

    /// Number of items to request per page of results (at most 100)
    #[arg(short = 'P', long, default_value = "100", value_parser = parse_page_size)]
    page_size: NonZeroUsize,

    /// File to write authored issues & pull requests to
    #[arg(long, default_value = "github.csv", value_name = "PATH")]
    issues_file: OutputArg,

    /// File to write reviewed issues & pull requests to
    #[arg(long, default_value = "reviews.csv", value_name = "PATH")]
    reviews_file: OutputArg,

    /// GraphQL endpoint to query
    #[arg(long, default_value = GRAPHQL_API_URL, value_name = "URL")]
    api_url: String,

    /// GitHub access token
    ///
    /// If not given, the token stored by `gh` is used, if any.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Increase logging verbosity (may be given multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// GitHub login of the user whose activity to export
    login: String,
}

fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    init_tracing(args.verbose);
    anyhow::ensure!(
        args.from <= args.to,
        "--from date {} is after --to date {}",
        args.from,
        args.to
    );
    let created = DateRange {
        from: args.from,
        to: args.to,
    };
    let client = build_client(args.token.as_deref())?.with_api_url(args.api_url);

    let big_start = Instant::now();

    let filter = authored_filter(&args.login, created);
    tracing::info!(%filter, "Fetching authored issues & pull requests …");
    let start = Instant::now();
    let issues = fetch_issues_and_prs(&client, filter, args.page_size);
    tracing::info!(
        "Fetched {} authored items in {:?}",
        issues.len(),
        start.elapsed()
    );
    export(&args.issues_file, &issues)?;

    let filter = reviewed_filter(&args.login, created, args.review_owner.as_deref());
    tracing::info!(%filter, "Fetching reviewed issues & pull requests …");
    let start = Instant::now();
    let reviews = fetch_reviews(&client, filter, args.page_size);
    tracing::info!(
        "Fetched {} reviewed items in {:?}",
        reviews.len(),
        start.elapsed()
    );
    export(&args.reviews_file, &reviews)?;

    tracing::info!("Total time: {:?}", big_start.elapsed());
    Ok(())
}

fn parse_date(input: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
}

/// GitHub's search connection returns at most 100 nodes per page
fn parse_page_size(input: &str) -> Result<NonZeroUsize, String> {
    let n = input
        .parse::<NonZeroUsize>()
        .map_err(|e| format!("invalid page size: {e}"))?;
    if n.get() > MAX_PAGE_SIZE {
        return Err(format!("page size must be at most {MAX_PAGE_SIZE}"));
    }
    Ok(n)
}

/// Build a client authenticated with `token` if given, else with the token
/// stored by `gh`.  Without either, requests go out unauthenticated and
/// fail, leaving both exports empty.
fn build_client(token: Option<&str>) -> anyhow::Result<Client> {
    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        return Client::new(token.trim()).context("failed to build GitHub client");
    }
    match Client::new_with_local_token() {
        Ok(client) => Ok(client),
        Err(e) => {
            let e = anyhow::Error::new(e);
            tracing::warn!("No GitHub token available; sending unauthenticated requests: {e:#}");
            Ok(Client::anonymous())
        }
    }
}

/// Log to stderr at `warn` by default, one level chattier per `-v`.
/// `RUST_LOG` overrides.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
