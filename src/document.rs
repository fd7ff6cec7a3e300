//! Document loading and chunk splitting.
//!
//! Loading reads whole files as UTF-8 and tags each [`Document`] with its
//! path as `source`. A file that cannot be read is logged and skipped so one
//! bad path never aborts a batch.
//!
//! Splitting is recursive on a separator ladder: paragraphs (`\n\n`), then
//! lines, then words, then single characters. Pieces are merged greedily up
//! to `chunk_size` characters, and each new chunk starts with up to
//! `chunk_overlap` characters carried over from the end of the previous one.
//! Every chunk inherits a copy of its parent's metadata plus a
//! `chunk_index` entry.
//!
//! # Example
//!
//! ```rust
//! use ragline::document::split_documents;
//! use ragline::models::Document;
//!
//! let doc = Document::new("Alpha paragraph.\n\nBeta paragraph.", "notes.md");
//! let chunks = split_documents(&[doc], 20, 0);
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].source(), Some("notes.md"));
//! ```

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::DocumentsConfig;
use crate::models::Document;
use crate::prompt::Language;

/// Metadata key holding a chunk's position within its parent document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// Separators tried in order, coarsest first. `""` splits into characters.
const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Read each path as a UTF-8 text document.
///
/// Failures (missing file, permission error, invalid UTF-8) are logged at
/// `warn` level and the file is omitted from the result.
pub fn load_text_files<P: AsRef<Path>>(paths: &[P]) -> Vec<Document> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                documents.push(Document::new(content, path.to_string_lossy()));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load file, skipping");
            }
        }
    }
    documents
}

/// Split documents into overlapping chunks of at most `chunk_size` characters.
///
/// `chunk_overlap` must be smaller than `chunk_size`; this is not checked
/// here (config loading checks it for the CLI).
pub fn split_documents(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Document> {
    let mut chunks = Vec::new();
    for doc in documents {
        let pieces = split_text(doc.content(), SEPARATORS, chunk_size, chunk_overlap);
        if pieces.is_empty() {
            debug!(source = doc.source().unwrap_or("unknown"), "Document has no text, no chunks");
        }
        for (index, piece) in pieces.into_iter().enumerate() {
            let mut metadata = doc.metadata().clone();
            metadata.insert(CHUNK_INDEX_KEY.to_string(), index.to_string());
            chunks.push(Document::with_metadata(piece, metadata));
        }
    }
    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_text(text: &str, separators: &[&str], chunk_size: usize, overlap: usize) -> Vec<String> {
    // Pick the coarsest separator present in the text.
    let (position, separator) = separators
        .iter()
        .enumerate()
        .find(|(_, sep)| sep.is_empty() || text.contains(*sep))
        .map(|(i, sep)| (i, *sep))
        .unwrap_or((separators.len(), ""));
    let finer = separators.get(position + 1..).unwrap_or(&[]);

    let splits: Vec<String> = if separator.is_empty() {
        text.chars().map(|c| c.to_string()).collect()
    } else {
        text.split(separator)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };

    let mut chunks = Vec::new();
    let mut good: Vec<String> = Vec::new();
    for piece in splits {
        if char_len(&piece) < chunk_size {
            good.push(piece);
            continue;
        }
        if !good.is_empty() {
            chunks.extend(merge_splits(&good, separator, chunk_size, overlap));
            good.clear();
        }
        if finer.is_empty() {
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
        } else {
            chunks.extend(split_text(&piece, finer, chunk_size, overlap));
        }
    }
    if !good.is_empty() {
        chunks.extend(merge_splits(&good, separator, chunk_size, overlap));
    }
    chunks
}

/// Greedily join `splits` with `separator` into chunks, keeping a tail of
/// at most `overlap` characters as the start of the next chunk.
fn merge_splits(splits: &[String], separator: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let sep_len = char_len(separator);
    let mut chunks = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in splits {
        let len = char_len(piece);
        let joiner = if current.is_empty() { 0 } else { sep_len };
        if total + len + joiner > chunk_size && !current.is_empty() {
            push_joined(&mut chunks, &current, separator);
            // Drop from the front until the carried-over tail fits the overlap
            // budget and leaves room for the incoming piece.
            loop {
                let joiner = if current.is_empty() { 0 } else { sep_len };
                let too_big = total > 0 && total + len + joiner > chunk_size;
                if total <= overlap && !too_big {
                    break;
                }
                let Some(front) = current.pop_front() else {
                    break;
                };
                let dropped_sep = if current.is_empty() { 0 } else { sep_len };
                total -= char_len(front) + dropped_sep;
            }
        }
        let joiner = if current.is_empty() { 0 } else { sep_len };
        current.push_back(piece);
        total += len + joiner;
    }
    push_joined(&mut chunks, &current, separator);
    chunks
}

fn push_joined(chunks: &mut Vec<String>, parts: &VecDeque<&str>, separator: &str) {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Recursively list files under `root` matching the include globs.
///
/// `.git`, `target`, and `node_modules` are always excluded. Output is
/// sorted for deterministic indexing.
pub fn scan_directory(
    root: &Path,
    include_globs: &[String],
    exclude_globs: &[String],
) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("Document root does not exist: {}", root.display());
    }

    let include_set = build_globset(include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(exclude_globs.iter().cloned());
    let exclude_set = build_globset(&default_excludes)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy();

        if exclude_set.is_match(rel_str.as_ref()) || !include_set.is_match(rel_str.as_ref()) {
            continue;
        }
        paths.push(path.to_path_buf());
    }

    paths.sort();
    Ok(paths)
}

/// Explicit `paths` followed by the scanned `root`, if configured.
pub fn configured_paths(config: &DocumentsConfig) -> Result<Vec<PathBuf>> {
    let mut paths = config.paths.clone();
    if let Some(root) = &config.root {
        paths.extend(scan_directory(root, &config.include_globs, &config.exclude_globs)?);
    }
    Ok(paths)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Three short built-in documents for trying the system without files.
pub fn demo_corpus(language: Language) -> Vec<Document> {
    let texts: [(&str, &str); 3] = match language {
        Language::English => [
            (
                "ml_intro",
                "Machine learning is a branch of artificial intelligence that lets computers \
                 learn from data without being explicitly programmed.\n\
                 The main types of machine learning are supervised learning, unsupervised \
                 learning and reinforcement learning.",
            ),
            (
                "deep_learning",
                "Deep learning uses neural networks with many layers.\n\
                 Popular frameworks: TensorFlow, PyTorch and Keras.\n\
                 CNNs are used for image processing, RNNs for sequential data.",
            ),
            (
                "langchain_info",
                "LangChain is a framework for building applications with language models.\n\
                 It provides tools for working with memory, chains and agents.\n\
                 LangGraph extends LangChain to build execution graphs.",
            ),
        ],
        Language::Russian => [
            (
                "ml_intro",
                "Машинное обучение - это раздел искусственного интеллекта, \
                 который позволяет компьютерам обучаться на данных без явного программирования.\n\
                 Основные типы машинного обучения: supervised learning, unsupervised learning \
                 и reinforcement learning.",
            ),
            (
                "deep_learning",
                "Глубокое обучение использует нейронные сети с множеством слоев.\n\
                 Популярные фреймворки: TensorFlow, PyTorch и Keras.\n\
                 CNN используются для обработки изображений, RNN - для последовательных данных.",
            ),
            (
                "langchain_info",
                "LangChain - это фреймворк для создания приложений с языковыми моделями.\n\
                 Он предоставляет инструменты для работы с памятью, цепочками и агентами.\n\
                 LangGraph расширяет LangChain для создания графов выполнения.",
            ),
        ],
    };

    texts
        .iter()
        .map(|(source, content)| Document::new(*content, *source))
        .collect()
}
