use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::Table;
use serde::Serialize;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lyric_recommender::{
    engine::matrix::SimilarityMatrix,
    ingest, ArtifactFetcher, ArtifactStore, CorpusTable, CoverArt, CoverLookup, FallbackCovers,
    FeatureBuilder, FeatureMatrix, RecommenderConfig, SimilarityEngine, SimilarityStrategy, SpotifyCovers,
};

#[derive(Parser, Debug)]
#[command(
    name = "lyric-recommender",
    version,
    about = "Recommend songs with similar lyrics (TF-IDF + cosine similarity)"
)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the index artifacts (overrides the config)
    #[arg(long = "artifact-dir", global = true)]
    artifact_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the index from a lyrics CSV (artist, song, text columns)
    Build {
        csv: PathBuf,

        /// Random sample size taken from the dataset
        #[arg(long)]
        sample: Option<usize>,

        /// Sampling seed
        #[arg(long)]
        seed: Option<u64>,

        /// Vocabulary size cap
        #[arg(long = "max-features")]
        max_features: Option<usize>,

        /// Also persist the full similarity matrix
        #[arg(long, default_value_t = false)]
        precompute: bool,
    },
    /// Print every indexed title in corpus order
    Titles,
    /// Print the songs most similar to a title
    Recommend {
        title: String,

        #[arg(long = "top-n")]
        top_n: Option<usize>,

        /// Look up album covers for each result
        #[arg(long, default_value_t = false)]
        covers: bool,

        /// Output JSON to stdout instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Similarity strategy (overrides the config)
        #[arg(long, value_enum)]
        similarity: Option<SimilarityStrategy>,
    },
    /// Download configured artifacts that are missing locally
    Fetch,
}

#[derive(Serialize)]
struct SongRow {
    #[serde(rename = "s_no")]
    rank: usize,
    artist: String,
    song: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover: Option<CoverArt>,
}

#[derive(Serialize)]
struct RecommendOutput {
    query: String,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_title: Option<String>,
    songs: Vec<SongRow>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("failed to install the log subscriber")?;

    let mut config = match &cli.config {
        Some(path) => RecommenderConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RecommenderConfig::default(),
    };
    if let Some(dir) = cli.artifact_dir {
        config.artifact_dir = dir;
    }

    match cli.command {
        Command::Build { csv, sample, seed, max_features, precompute } => {
            if sample.is_some() {
                config.sample_size = sample;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if let Some(max) = max_features {
                config.max_features = max;
            }
            build(&config, &csv, precompute)
        }
        Command::Titles => titles(&config),
        Command::Recommend { title, top_n, covers, json, similarity } => {
            if let Some(n) = top_n {
                config.top_n = n;
            }
            if let Some(strategy) = similarity {
                config.similarity = strategy;
            }
            recommend(&config, &title, covers, json)
        }
        Command::Fetch => fetch(&config),
    }
}

fn build(config: &RecommenderConfig, csv: &Path, precompute: bool) -> Result<()> {
    let raw = ingest::read_csv(csv).with_context(|| format!("failed to read dataset {}", csv.display()))?;
    let raw = match config.sample_size {
        Some(n) => ingest::sample(raw, n, config.seed),
        None => raw,
    };
    let corpus = CorpusTable::from_raw(&raw);
    let features: FeatureMatrix = FeatureBuilder::new(config.max_features)
        .with_min_token_len(config.min_token_len)
        .fit_transform(&corpus.cleaned_texts())
        .context("failed to vectorize lyrics")?;
    let similarity = precompute.then(|| SimilarityMatrix::compute(&features));

    let store = ArtifactStore::new(&config.artifact_dir);
    store
        .save(&corpus, &features, similarity.as_ref())
        .context("failed to save artifacts")?;

    println!(
        "{} {} songs, {} features -> {}",
        "Indexed".green().bold(),
        corpus.len(),
        features.n_features(),
        store.dir().display()
    );
    Ok(())
}

/// Pull missing artifacts when remote sources are configured
fn ensure_artifacts(config: &RecommenderConfig) -> Result<()> {
    let sources = &config.sources;
    if sources.corpus.is_none() && sources.features.is_none() && sources.similarity.is_none() {
        return Ok(());
    }
    let fetcher = ArtifactFetcher::new(ArtifactStore::new(&config.artifact_dir), sources.clone())?;
    fetcher.ensure_all().context("failed to fetch artifacts")
}

fn titles(config: &RecommenderConfig) -> Result<()> {
    ensure_artifacts(config)?;
    // lazy: listing never needs the similarity matrix
    let engine = SimilarityEngine::load(&config.artifact_dir, SimilarityStrategy::Lazy)
        .context("failed to load the recommendation index")?;
    for title in engine.list_titles() {
        println!("{}", title);
    }
    Ok(())
}

fn recommend(config: &RecommenderConfig, title: &str, with_covers: bool, json: bool) -> Result<()> {
    ensure_artifacts(config)?;
    let engine = SimilarityEngine::load(&config.artifact_dir, config.similarity)
        .context("failed to load the recommendation index")?;

    let Some(recs) = engine.recommend(title, config.top_n) else {
        if json {
            let out = RecommendOutput {
                query: title.to_string(),
                found: false,
                resolved_title: None,
                songs: Vec::new(),
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("{}", "song not found".red());
        }
        return Ok(());
    };

    let lookup: Option<Box<dyn CoverLookup>> = with_covers.then(|| match SpotifyCovers::from_env(&config.covers) {
        Some(spotify) => Box::new(spotify) as Box<dyn CoverLookup>,
        None => {
            info!("Spotify credentials not set, using the fallback cover");
            Box::new(FallbackCovers::new(config.covers.fallback_url.clone()))
        }
    });

    let rows: Vec<SongRow> = recs
        .songs
        .into_iter()
        .map(|s| SongRow {
            cover: lookup.as_ref().map(|l| l.lookup_cover(&s.song, &s.artist)),
            rank: s.rank,
            artist: s.artist,
            song: s.song,
        })
        .collect();

    if json {
        let out = RecommendOutput {
            query: title.to_string(),
            found: true,
            resolved_title: Some(recs.resolved_title),
            songs: rows,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut table = Table::new();
    let mut header = vec!["S.No.".bold(), "Artist".bold(), "Song".bold()];
    if with_covers {
        header.push("Cover".bold());
    }
    table.set_header(header);
    for row in &rows {
        let mut cells = vec![row.rank.to_string(), row.artist.clone(), row.song.clone()];
        if let Some(cover) = &row.cover {
            cells.push(cover.url().to_string());
        }
        table.add_row(cells);
    }
    println!("{} {}", "Songs like".green().bold(), recs.resolved_title.bold());
    println!("{}", table);
    Ok(())
}

fn fetch(config: &RecommenderConfig) -> Result<()> {
    let store = ArtifactStore::new(&config.artifact_dir);
    let fetcher = ArtifactFetcher::new(store, config.sources.clone())?;
    fetcher.ensure_all().context("failed to fetch artifacts")?;
    println!("{} {}", "Artifacts ready in".green().bold(), fetcher.store().dir().display());
    Ok(())
}
