// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};
use tunelens_config::load as load_config;
use tunelens_domain::TimeDimension;
use tunelens_sources::{compose, Dashboard, DashboardSnapshot};

/// Print a listening-history dashboard snapshot.
#[derive(Debug, Parser)]
#[command(name = "tunelens", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "TUNELENS_CONFIG")]
    config: Option<PathBuf>,

    /// Time window: week, month, three_months, six_months, year, all_time.
    #[arg(long, default_value = "month")]
    range: TimeDimension,

    /// Entries per list.
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Emit the snapshot as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_filter = init_tracing();
    let config = load_config(cli.config.as_deref())?;
    if std::env::var_os("RUST_LOG").is_none() {
        log_filter.reload(EnvFilter::new(&config.telemetry.log_level))?;
    }

    let composition = compose(&config)?;
    if !composition.auth.is_authenticated() {
        match composition.auth.login().await {
            Ok(user) => info!(target: "cli", user = %user.id, "signed in"),
            Err(error) => warn!(target: "cli", %error, "continuing without a session"),
        }
    }

    let snapshot = Dashboard::new(composition.data_source)
        .snapshot(cli.range, cli.limit)
        .await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render(&snapshot));
    }

    Ok(())
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Install the global subscriber before anything logs. Without `RUST_LOG` it
/// starts at `info`; the returned handle swaps in the configured level.
fn init_tracing() -> FilterHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (subscriber, handle) = build_subscriber(env_filter, std::io::stderr);
    subscriber.init();
    handle
}

fn build_subscriber<W>(
    env_filter: EnvFilter,
    make_writer: W,
) -> (impl tracing::Subscriber + Send + Sync + 'static, FilterHandle)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(make_writer);

    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer);
    (subscriber, handle)
}

fn render(snapshot: &DashboardSnapshot) -> String {
    let stats = &snapshot.stats;
    let mut out = String::new();

    out.push_str(&format!(
        "tunelens: {} ({} source, {} to {})\n\n",
        snapshot.dimension,
        snapshot.source,
        snapshot.window.start.format("%Y-%m-%d"),
        snapshot.window.end.format("%Y-%m-%d"),
    ));

    if !stats.has_data {
        out.push_str("No listening data for this window.\n");
        return out;
    }

    out.push_str(&format!(
        "  tracks {}  artists {}  genres {}  top genre {}\n",
        stats.total_tracks,
        stats.total_artists,
        stats.unique_genres,
        stats.top_genre.as_deref().unwrap_or("-"),
    ));
    out.push_str(&format!(
        "  listening {:.1} h  avg popularity {:.1}  plays {} ({} in last 30 days)  {:.1} min/day\n",
        stats.listening_time_hours,
        stats.average_popularity,
        stats.total_plays,
        stats.recent_tracks_count,
        stats.daily_average_minutes,
    ));

    out.push_str("\nTop tracks\n");
    for (rank, track) in snapshot.top_tracks.iter().enumerate() {
        let artist = track
            .primary_artist()
            .map(|artist| artist.name.as_str())
            .unwrap_or("unknown artist");
        out.push_str(&format!(
            "  {:>2}. {} - {} [{}]\n",
            rank + 1,
            track.name,
            artist,
            track.popularity.unwrap_or(0)
        ));
    }

    out.push_str("\nTop artists\n");
    for (rank, artist) in snapshot.top_artists.iter().enumerate() {
        out.push_str(&format!("  {:>2}. {}\n", rank + 1, artist.name));
    }

    out.push_str("\nMost played\n");
    for entry in &snapshot.most_played_tracks {
        out.push_str(&format!("  {:>3}x {}\n", entry.plays, entry.item.name));
    }

    out.push_str("\nGenres\n");
    for genre in snapshot.genres.iter().take(5) {
        out.push_str(&format!(
            "  {:<24} {:>5.1}%  ({} artists)\n",
            genre.name,
            genre.percentage,
            genre.artist_count()
        ));
    }

    if !snapshot.quality.is_clean() {
        out.push_str(&format!(
            "\n{} record(s) failed validation\n",
            snapshot.quality.issues.len()
        ));
    }

    out
}
