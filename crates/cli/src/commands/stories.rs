//! Stories command handler.
//!
//! Search, ingest and inspect the success story corpus.

use super::print_json;
use clap::{Args, Subcommand};
use peerconnect_core::{config::AppConfig, AppResult};
use peerconnect_stories::{
    ingest, load_articles, load_corpus, load_corpus_for_update, save_corpus, IngestOptions,
    ProgressEvent, ProgressReporter, RetrievalContext, ToneClassifier,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Search, ingest and inspect the story corpus
#[derive(Args, Debug)]
pub struct StoriesCommand {
    #[command(subcommand)]
    pub action: StoriesAction,
}

#[derive(Subcommand, Debug)]
pub enum StoriesAction {
    /// Find the stories most similar to a text
    Search(StoriesSearchCommand),
    /// Label fetched articles and add them to the corpus
    Ingest(StoriesIngestCommand),
    /// Show corpus statistics
    Stats(StoriesStatsCommand),
}

impl StoriesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            StoriesAction::Search(cmd) => cmd.execute(config).await,
            StoriesAction::Ingest(cmd) => cmd.execute(config).await,
            StoriesAction::Stats(cmd) => cmd.execute(config),
        }
    }
}

/// Find similar stories
#[derive(Args, Debug)]
pub struct StoriesSearchCommand {
    /// Query text
    pub text: String,

    /// Number of stories to return (default: retrieval.topK)
    #[arg(short = 'k', long = "top-k")]
    pub top_k: Option<usize>,

    /// Minimum similarity (default: retrieval.threshold)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StoriesSearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stories search command");

        let context = RetrievalContext::initialize(config).await?;
        let k = self.top_k.unwrap_or(context.top_k());
        let threshold = self.threshold.unwrap_or(context.threshold());
        let matches = context.search(&self.text, k, threshold).await?;

        if self.json {
            return print_json(&matches);
        }

        if matches.is_empty() {
            println!(
                "No stories scored at least {:.2} ({} stories indexed)",
                threshold,
                context.index().len()
            );
            return Ok(());
        }

        for m in &matches {
            println!("[{:.3}] #{} ({})", m.score, m.position, m.record.tone_label());
            println!("    {}", m.record.story);
        }
        Ok(())
    }
}

/// Label fetched articles and add them to the corpus
#[derive(Args, Debug)]
pub struct StoriesIngestCommand {
    /// JSON list of fetched articles
    pub input: PathBuf,

    /// Stop after this many new stories
    #[arg(long, default_value = "10")]
    pub max: usize,

    /// Corpus file to extend (default: retrieval.storiesFile)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StoriesIngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stories ingest command from {:?}", self.input);

        let out = self.out.clone().unwrap_or_else(|| config.stories_path());
        let articles = load_articles(&self.input)?;
        let mut stories = load_corpus_for_update(&out)?.into_records();
        let classifier = ToneClassifier::from_config(config)?;

        let progress = if self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| {
                eprintln!("{}", event.format_simple())
            }))
        };

        let options = IngestOptions {
            max_articles: self.max,
            ..IngestOptions::default()
        };
        let report = ingest(&mut stories, &articles, &classifier, &options, &progress).await;

        if report.added > 0 {
            save_corpus(&out, &stories)?;
            progress.store(stories.len() as u64, &out.display().to_string());
        }

        if self.json {
            return print_json(&serde_json::json!({
                "output": out,
                "storiesCount": stories.len(),
                "report": report,
            }));
        }

        println!(
            "Added {} stories to {} ({} total)",
            report.added,
            out.display(),
            stories.len()
        );
        println!(
            "Skipped: {} too short, {} duplicate, {} without tone, {} failed",
            report.too_short, report.duplicates, report.unlabelled, report.failed
        );
        Ok(())
    }
}

/// Show corpus statistics
#[derive(Args, Debug)]
pub struct StoriesStatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StoriesStatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let path = config.stories_path();
        let stats = load_corpus(&path)?.stats();

        if self.json {
            return print_json(&stats);
        }

        println!("Corpus: {}", path.display());
        println!("Stories: {}", stats.stories_count);
        println!("Malformed entries skipped: {}", stats.malformed_count);
        println!("Without tone: {}", stats.untoned_count);
        if !stats.tones.is_empty() {
            println!("Tones:");
            for (tone, count) in &stats.tones {
                println!("  {:<16} {}", tone, count);
            }
        }
        Ok(())
    }
}
