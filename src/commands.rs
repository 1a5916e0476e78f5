use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::docstore::{Document, SqliteDocstore};
use crate::extraction::TripletExtractor;
use crate::index::{BuildReport, Collaborators, KnowledgeGraphIndex};
use crate::ollama::OllamaClient;

/// Wire the SQLite docstore and Ollama collaborators into the persisted index
#[inline]
pub async fn open_index(config: &Config) -> Result<KnowledgeGraphIndex> {
    let docstore = SqliteDocstore::initialize_from_config_dir(config.get_base_dir())
        .await
        .context("Failed to open docstore")?;
    let ollama = Arc::new(
        OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?,
    );

    let extractor: Arc<dyn TripletExtractor> = Arc::<OllamaClient>::clone(&ollama);
    let collaborators = Collaborators::new(Arc::new(docstore))
        .with_extractor(extractor)
        .with_embed_model(ollama);

    let index =
        KnowledgeGraphIndex::load_or_new(config.index_path(), config.index.clone(), collaborators)
            .with_context(|| format!("Failed to open index at {}", config.index_path().display()))?;

    Ok(index)
}

/// Read text files as documents keyed by their path
#[inline]
pub fn read_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    paths
        .iter()
        .map(|path| -> Result<Document> {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(Document::with_id(document_id(path), text))
        })
        .collect()
}

fn document_id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Index text files and persist the result after every document
#[inline]
pub async fn build_index(config: &Config, paths: &[PathBuf]) -> Result<BuildReport> {
    let documents = read_documents(paths)?;
    if documents.is_empty() {
        println!("No documents given.");
        return Ok(BuildReport::default());
    }

    if config.index.extract_triplets || config.index.include_embeddings {
        let client = OllamaClient::new(&config.ollama)?;
        tokio::task::spawn_blocking(move || client.health_check())
            .await
            .context("Health check task failed")?
            .context("Ollama is not ready")?;
    }

    let mut index = open_index(config).await?;
    let index_path = config.index_path();
    let mut report = BuildReport::default();

    let bar = if console::user_attended_stderr() {
        ProgressBar::new(documents.len() as u64).with_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] Indexing {msg}")
                .context("Invalid progress template")?,
        )
    } else {
        ProgressBar::hidden()
    };

    for document in &documents {
        bar.set_message(document.id.clone());

        let document_report = index
            .insert_document(document, &config.chunking)
            .await
            .with_context(|| format!("Failed to index {}", document.id))?;
        report.merge(document_report);

        index.save(&index_path)?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        "Indexed {} documents into {}",
        report.documents,
        index_path.display()
    );

    println!("Indexed {} documents", report.documents);
    println!("  Chunks indexed: {}", report.chunks_indexed);
    println!("  Triplets upserted: {}", report.triplets_upserted);
    println!("  Keywords: {}", index.keyword_count());
    if report.skipped_empty_chunks > 0 {
        println!("  Skipped chunks without triplets: {}", report.skipped_empty_chunks);
    }
    for failure in &report.failed_chunks {
        println!(
            "  ⚠️  Extraction failed for {} ({}): {}",
            failure.chunk_id, failure.doc_id, failure.message
        );
    }
    for failure in &report.embedding_failures {
        println!(
            "  ⚠️  Embedding failed for {}: {}",
            failure.triplet, failure.message
        );
    }

    Ok(report)
}

/// Print the chunks indexed under a keyword
#[inline]
pub async fn show_keyword(config: &Config, keyword: &str) -> Result<()> {
    let index = open_index(config).await?;
    let chunk_ids: Vec<String> = index.lookup_by_keyword(keyword).into_iter().collect();

    if chunk_ids.is_empty() {
        println!("No chunks found for keyword '{}'.", keyword);
        return Ok(());
    }

    println!("Keyword '{}' appears in {} chunks:", keyword, chunk_ids.len());
    for chunk in index.get_chunks(&chunk_ids).await? {
        println!();
        println!("📄 {} ({})", chunk.id, chunk.ref_doc_id.as_deref().unwrap_or("-"));
        println!("{}", chunk.text.trim());
    }

    Ok(())
}

/// Print a subject's edges, or its relation paths when `depth` is given
#[inline]
pub async fn show_edges(config: &Config, subject: &str, depth: Option<usize>) -> Result<()> {
    let index = open_index(config).await?;

    if let Some(depth) = depth {
        let rel_map = index.rel_map(&[subject.to_string()], depth, 30);
        let Some(paths) = rel_map.get(subject) else {
            println!("No relations found for '{}'.", subject);
            return Ok(());
        };
        for path in paths {
            println!("{}", path.iter().join(" -> "));
        }
        return Ok(());
    }

    let edges = index.lookup_edges(subject);
    if edges.is_empty() {
        println!("No edges found for '{}'.", subject);
        return Ok(());
    }

    for (predicate, object) in edges {
        println!("({}, {}, {})", subject, predicate, object);
    }
    Ok(())
}

/// Print the relations most similar to `text`
#[inline]
pub async fn find_similar(config: &Config, text: &str, top_k: usize) -> Result<()> {
    let index = open_index(config).await?;

    if index.embedding_table().is_none_or(|table| table.is_empty()) {
        println!("No relation embeddings stored. Build with --embeddings first.");
        return Ok(());
    }

    let results = index.similar_relations_to_text(text, top_k).await?;
    for (relation, score) in results {
        println!("{:.4}  {}", score, relation);
    }
    Ok(())
}

/// Print every tracked document with its chunk count
#[inline]
pub async fn list_documents(config: &Config) -> Result<()> {
    let index = open_index(config).await?;
    let ref_doc_info = index.ref_doc_info();

    if ref_doc_info.is_empty() {
        println!("No documents have been indexed yet.");
        println!("Use 'kg-index build <files>' to index some.");
        return Ok(());
    }

    println!("Documents ({} total):", ref_doc_info.len());
    for (doc_id, info) in ref_doc_info {
        println!("📚 {} ({} chunks)", doc_id, info.node_ids.len());
    }

    println!();
    println!("Summary:");
    println!("  Nodes: {}", index.node_count());
    println!("  Keywords: {}", index.keyword_count());
    println!("  Triplets: {}", index.triplets().count());
    if let Some(table) = index.embedding_table() {
        println!("  Relation embeddings: {}", table.len());
    }
    Ok(())
}

/// Remove a document from the index and, unless asked not to, its chunks
#[inline]
pub async fn delete_document(config: &Config, doc_id: &str, keep_chunks: bool) -> Result<()> {
    let mut index = open_index(config).await?;

    if !index.delete_ref_doc(doc_id, !keep_chunks).await? {
        warn!("Document {} is not in the index", doc_id);
        println!("Document not found: {}", doc_id);
        return Ok(());
    }

    index.save(config.index_path())?;
    println!("Deleted document: {}", doc_id);
    Ok(())
}
