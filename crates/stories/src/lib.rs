//! Success story retrieval for PeerConnect.
//!
//! Loads the story corpus, embeds it with one configured provider and
//! answers "which stories are closest to this mood entry" by cosine
//! similarity. Also hosts the supporting pieces around retrieval: tone
//! labelling, story ingestion and the check-in journal.

pub mod context;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod journal;
pub mod progress;
pub mod text;
pub mod tone;
pub mod types;
pub mod vector;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use context::RetrievalContext;
pub use corpus::{load_corpus, load_corpus_for_update, save_corpus, Corpus};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::SimilarityIndex;
pub use ingest::{ingest, load_articles, IngestOptions, IngestReport, RawArticle};
pub use journal::{DiaryEntry, Journal};
pub use progress::{ProgressEvent, ProgressReporter};
pub use tone::{Tone, ToneClassifier};
pub use types::{CorpusStats, StoryMatch, StoryRecord};
