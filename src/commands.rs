//! Command implementations behind the `ragline` binary.
//!
//! Each `run_*` function takes a loaded [`Config`] and does the work of one
//! subcommand. User-facing output goes to stdout; progress and diagnostics
//! go to stderr.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::chat::{format_report, run_repl};
use crate::config::Config;
use crate::document::{configured_paths, demo_corpus, load_text_files, split_documents};
use crate::embedding::create_embedder;
use crate::generation::{AnswerGenerator, OllamaGenerator};
use crate::index::{InMemoryIndex, VectorIndex};
use crate::models::Document;
use crate::monitor::QueryMonitor;
use crate::pipeline::Pipeline;
use crate::progress::{IndexProgressEvent, ProgressMode};

/// Where `index` takes its documents from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// The built-in demo corpus in the configured language.
    Demo,
    /// Explicit file paths.
    Paths(Vec<PathBuf>),
    /// `[documents]` from the config file.
    Configured,
}

/// Open the persisted index for `config` without adding anything.
pub fn open_index(config: &Config) -> Result<InMemoryIndex> {
    let embedder = create_embedder(&config.embedding)?;
    let index = InMemoryIndex::open(&config.index.persist_dir, embedder)?
        .with_batch_size(config.embedding.batch_size);
    Ok(index)
}

fn load_chunks(
    config: &Config,
    source: &DocumentSource,
    progress: ProgressMode,
) -> Result<Vec<Document>> {
    let documents = match source {
        DocumentSource::Demo => demo_corpus(config.generation.language),
        DocumentSource::Paths(paths) => load_text_files(paths),
        DocumentSource::Configured => load_text_files(&configured_paths(&config.documents)?),
    };
    let chunks = split_documents(
        &documents,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
    );

    progress.reporter().report(IndexProgressEvent::Loaded {
        documents: documents.len() as u64,
        chunks: chunks.len() as u64,
    });
    info!(
        "Loaded {} documents, {} chunks",
        documents.len(),
        chunks.len()
    );
    Ok(chunks)
}

/// Load, split, embed and persist documents. Returns the index and the
/// number of chunks newly added.
pub async fn build_index(
    config: &Config,
    source: &DocumentSource,
    progress: ProgressMode,
) -> Result<(InMemoryIndex, usize)> {
    let index = open_index(config)?.with_progress(progress.reporter());
    let chunks = load_chunks(config, source, progress)?;

    let added = index.add_documents(&chunks).await?;
    index.persist()?;
    Ok((index, added))
}

/// The demo corpus embedded into a fresh index that is never written to disk.
pub async fn demo_index(config: &Config, progress: ProgressMode) -> Result<InMemoryIndex> {
    let embedder = create_embedder(&config.embedding)?;
    let index = InMemoryIndex::new(embedder)
        .with_batch_size(config.embedding.batch_size)
        .with_progress(progress.reporter());
    let chunks = load_chunks(config, &DocumentSource::Demo, progress)?;
    index.add_documents(&chunks).await?;
    Ok(index)
}

fn build_pipeline(
    config: &Config,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn AnswerGenerator>,
) -> Pipeline {
    Pipeline::new(index, generator, config.generation.language).with_top_k(config.retrieval.top_k)
}

/// `ragline index`
pub async fn run_index(
    config: &Config,
    source: DocumentSource,
    progress: ProgressMode,
) -> Result<()> {
    let (index, added) = build_index(config, &source, progress).await?;
    println!(
        "Indexed {} new chunks ({} total) into {}",
        added,
        index.len(),
        config.index.persist_dir.display()
    );
    Ok(())
}

/// `ragline ask`
pub async fn run_ask(config: &Config, question: &str, json: bool) -> Result<()> {
    let index = open_index(config)?;
    if index.is_empty() {
        warn!(
            "Index at {} is empty; run `ragline index` first",
            config.index.persist_dir.display()
        );
    }
    let generator = Arc::new(OllamaGenerator::new(&config.llm)?);
    let pipeline = build_pipeline(config, Arc::new(index), generator);

    let start = Instant::now();
    let result = pipeline.query(question).await?;
    let elapsed = start.elapsed().as_secs_f64();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_report(question, &result, elapsed));
    }
    Ok(())
}

/// `ragline chat`
///
/// With `--demo` the session runs on the demo corpus alone and the persisted
/// index is left untouched. Otherwise an empty index is first filled from
/// `[documents]` when the config names any.
pub async fn run_chat(config: &Config, demo: bool, progress: ProgressMode) -> Result<()> {
    let has_configured_docs =
        !config.documents.paths.is_empty() || config.documents.root.is_some();

    let index = if demo {
        demo_index(config, progress).await?
    } else {
        let index = open_index(config)?;
        if index.is_empty() && has_configured_docs {
            build_index(config, &DocumentSource::Configured, progress).await?.0
        } else {
            index
        }
    };
    let chunks = index.len();
    if chunks == 0 {
        warn!("Index is empty; every question will get the fallback answer");
    }

    let generator = Arc::new(OllamaGenerator::new(&config.llm)?);
    if let Err(e) = generator.health_check().await {
        warn!("{:#}", e);
    }

    let pipeline = build_pipeline(config, Arc::new(index), generator);
    let mut monitor = QueryMonitor::new();

    println!(
        "Ready: {} chunks indexed, model {}. List local models with `ollama list`.",
        chunks, config.llm.model
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    run_repl(&pipeline, &mut monitor, stdin.lock(), &mut stdout, &mut stderr).await?;
    stdout.flush()?;
    Ok(())
}

/// `ragline health`
pub async fn run_health(config: &Config) -> Result<()> {
    let generator = OllamaGenerator::new(&config.llm)?;
    let models = generator
        .health_check()
        .await
        .context("Ollama health check failed")?;

    println!("Ollama at {}: ok ({} models)", generator.base_url(), models.len());

    let wanted = &config.llm.model;
    let pulled = models
        .iter()
        .any(|m| m == wanted || m.strip_suffix(":latest") == Some(wanted.as_str()));
    if pulled {
        println!("Model {}: available", wanted);
    } else {
        println!("Model {}: not pulled (run `ollama pull {}`)", wanted, wanted);
    }
    Ok(())
}
