// SPDX-License-Identifier: MPL-2.0

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use topsongs::api::{self, GaanaClient, Language};
use topsongs::{Config, FailureKind, Resolver};

#[derive(Parser)]
#[command(name = "topsongs", version, about = "Gaana top songs and stream URLs")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a song's seokey into a playable stream URL
    Stream { seokey: String },
    /// List the most popular songs for a language
    Top {
        #[arg(long)]
        lang: Option<String>,
        /// Only show songs whose title, album or artists contain this text
        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("topsongs=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match GaanaClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Stream { seokey } => stream(client, &config, &seokey).await,
        Command::Top { lang, search } => {
            let lang = lang.unwrap_or_else(|| config.default_language.clone());
            top(&client, &lang, search.as_deref().unwrap_or("")).await
        }
    }
}

async fn stream(client: GaanaClient, config: &Config, seokey: &str) -> ExitCode {
    let resolver = Resolver::new(client, config);
    match resolver.resolve(seokey).await {
        Ok(url) => {
            println!("{}", json!({ "url": url }));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(seokey, "stream resolution failed: {e}");
            println!("{}", json!({ "error": e.to_string(), "kind": e.kind() }));
            ExitCode::from(exit_code(e.kind()))
        }
    }
}

fn exit_code(kind: FailureKind) -> u8 {
    match kind {
        FailureKind::BadInput => 2,
        FailureKind::UpstreamFormatChanged => 3,
        FailureKind::DecryptionFailed => 4,
        FailureKind::FetchFailed => 5,
    }
}

async fn top(client: &GaanaClient, lang: &str, search: &str) -> ExitCode {
    if Language::from_code(lang).is_none() {
        warn!(lang, "language is not one of the catalog's listed languages");
    }

    let tracks = match client.top_songs(lang).await {
        Ok(tracks) => tracks,
        Err(e) => {
            error!(lang, "top songs fetch failed: {e}");
            println!("{}", json!({ "error": "Backend fetch failed", "details": e.to_string() }));
            return ExitCode::FAILURE;
        }
    };

    let ranked: Vec<_> = api::rank(&tracks, search)
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            json!({
                "rank": i + 1,
                "track_id": t.track_id,
                "seokey": t.seokey,
                "title": t.track_title,
                "album": t.album_title,
                "artists": t.artist_names(),
                "year": t.release_year(),
                "artwork": t.artwork_large,
                "popularity": t.popularity_score(),
            })
        })
        .collect();

    println!("{}", serde_json::Value::Array(ranked));
    ExitCode::SUCCESS
}
