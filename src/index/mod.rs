// Index module
// The knowledge-graph index: upserts, document ingestion, retrieval and persistence


pub mod provenance;
pub mod structure;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chunking::{ChunkingConfig, split_document};
use crate::config::IndexConfig;
use crate::docstore::{Chunk, Docstore, Document};
use crate::embeddings::{EmbeddingModel, top_k_similar};
use crate::extraction::{
    KeywordExtractor, PromptTemplate, TripletExtractor, default_keyword_extractor,
    stopword_keyword_extractor,
};
use crate::triplet::{Triplet, parse_triplet_response};
use crate::{KgError, Result};

pub use provenance::{ProvenanceTracker, RefDocInfo};
pub use structure::{EmbeddingTable, KeywordTable, KgIndexStruct, TripletTable};

const INDEX_FORMAT_VERSION: u32 = 1;

/// What to do with a chunk that yields no triplets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptyChunkPolicy {
    /// Store the chunk and record it as a node with no keywords
    #[default]
    Keep,
    /// Leave the chunk out of the index entirely
    Skip,
}

/// What to do when the extraction model fails for a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionFailurePolicy {
    /// Stop the build and return the failure with its document and chunk
    #[default]
    Abort,
    /// Leave the chunk out, report it and keep going
    SkipChunk,
}

/// An embedding step that failed after its triplet was stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddingFailure {
    /// Canonical triplet string
    pub triplet: String,
    pub message: String,
}

/// A chunk left out of the index because extraction failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkFailure {
    pub doc_id: String,
    pub chunk_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// The edge was not in the triplet table before
    pub new_edge: bool,
    /// A new embedding was computed and stored
    pub embedded: bool,
    pub embedding_failure: Option<EmbeddingFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub documents: usize,
    pub chunks_indexed: usize,
    pub triplets_upserted: usize,
    pub skipped_empty_chunks: usize,
    pub failed_chunks: Vec<ChunkFailure>,
    pub embedding_failures: Vec<EmbeddingFailure>,
}

impl BuildReport {
    #[inline]
    pub fn merge(&mut self, other: Self) {
        self.documents += other.documents;
        self.chunks_indexed += other.chunks_indexed;
        self.triplets_upserted += other.triplets_upserted;
        self.skipped_empty_chunks += other.skipped_empty_chunks;
        self.failed_chunks.extend(other.failed_chunks);
        self.embedding_failures.extend(other.embedding_failures);
    }

    /// Whether anything was reported as failed without aborting the build
    #[inline]
    pub fn has_failures(&self) -> bool {
        !self.failed_chunks.is_empty() || !self.embedding_failures.is_empty()
    }
}

/// The services an index calls out to
#[derive(Clone)]
pub struct Collaborators {
    pub docstore: Arc<dyn Docstore>,
    pub extractor: Option<Arc<dyn TripletExtractor>>,
    pub embed_model: Option<Arc<dyn EmbeddingModel>>,
}

impl Collaborators {
    #[inline]
    pub fn new(docstore: Arc<dyn Docstore>) -> Self {
        Self {
            docstore,
            extractor: None,
            embed_model: None,
        }
    }

    #[inline]
    pub fn with_extractor(mut self, extractor: Arc<dyn TripletExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    #[inline]
    pub fn with_embed_model(mut self, embed_model: Arc<dyn EmbeddingModel>) -> Self {
        self.embed_model = Some(embed_model);
        self
    }
}

#[derive(Serialize)]
struct PersistedIndexRef<'a> {
    version: u32,
    index_struct: &'a KgIndexStruct,
    provenance: &'a ProvenanceTracker,
}

#[derive(Deserialize)]
struct PersistedIndex {
    version: u32,
    index_struct: KgIndexStruct,
    provenance: ProvenanceTracker,
}

/// Keyword table, triplet table, optional relation embeddings and document
/// provenance, kept in step with a docstore.
///
/// Every mutation goes through `&mut self`, so table updates are serialized
/// even when extraction runs concurrently.
pub struct KnowledgeGraphIndex {
    index_struct: KgIndexStruct,
    provenance: ProvenanceTracker,
    collaborators: Collaborators,
    keyword_extractor: KeywordExtractor,
    prompt: PromptTemplate,
    settings: IndexConfig,
}

impl KnowledgeGraphIndex {
    /// Create an empty index.
    ///
    /// Fails when embeddings are enabled without an embedding model.
    #[inline]
    pub fn new(settings: IndexConfig, collaborators: Collaborators) -> Result<Self> {
        if settings.include_embeddings && collaborators.embed_model.is_none() {
            return Err(KgError::Config(
                "Relation embeddings are enabled but no embedding model was provided".to_string(),
            ));
        }

        let keyword_extractor = if settings.stopwords.is_empty() {
            default_keyword_extractor()
        } else {
            stopword_keyword_extractor(&settings.stopwords)
        };

        Ok(Self {
            index_struct: KgIndexStruct::new(settings.include_embeddings),
            provenance: ProvenanceTracker::default(),
            collaborators,
            keyword_extractor,
            prompt: PromptTemplate::default()
                .with_max_knowledge_triplets(settings.max_triplets_per_chunk),
            settings,
        })
    }

    /// Build a new index from whole documents, splitting each with `chunking`
    #[inline]
    pub async fn build_from_documents(
        documents: &[Document],
        settings: IndexConfig,
        collaborators: Collaborators,
        chunking: &ChunkingConfig,
    ) -> Result<(Self, BuildReport)> {
        let mut index = Self::new(settings, collaborators)?;
        let mut report = BuildReport::default();

        for document in documents {
            report.merge(index.insert_document(document, chunking).await?);
        }

        info!(
            "Built index from {} documents: {} chunks, {} triplets, {} keywords",
            report.documents,
            report.chunks_indexed,
            report.triplets_upserted,
            index.keyword_count()
        );

        Ok((index, report))
    }

    #[inline]
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// Replace the strategy that picks a triplet's keywords
    #[inline]
    pub fn with_keyword_extractor(mut self, keyword_extractor: KeywordExtractor) -> Self {
        self.keyword_extractor = keyword_extractor;
        self
    }

    #[inline]
    pub fn settings(&self) -> &IndexConfig {
        &self.settings
    }

    #[inline]
    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    #[inline]
    pub fn index_struct(&self) -> &KgIndexStruct {
        &self.index_struct
    }

    #[inline]
    pub fn docstore(&self) -> &Arc<dyn Docstore> {
        &self.collaborators.docstore
    }

    /// Store a chunk and index its id under each keyword.
    ///
    /// The chunk is recorded under its source document, or under its own id
    /// when it has none.
    #[inline]
    pub async fn add_node(&mut self, keywords: &[String], chunk: &Chunk) -> Result<()> {
        let doc_id = chunk.ref_doc_id.as_deref().unwrap_or(&chunk.id);

        match self.provenance.owner_of(&chunk.id) {
            Some(owner) if owner != doc_id => {
                return Err(chunk_owned_elsewhere(&chunk.id, owner));
            }
            _ => {}
        }

        let chunk_id = self.collaborators.docstore.add(chunk).await?;

        self.index_struct.add_node(keywords, &chunk_id);
        self.provenance
            .record(doc_id, &chunk_id)
            .map_err(|owner| chunk_owned_elsewhere(&chunk_id, &owner))?;

        debug!(
            "Indexed chunk {} under {} keywords",
            chunk_id,
            keywords.len()
        );
        Ok(())
    }

    /// Store a triplet's edge and register its keywords.
    ///
    /// With embeddings enabled, a triplet seen for the first time is embedded
    /// by its canonical string. An embedding failure leaves the structural
    /// changes in place and comes back in the report.
    #[inline]
    pub async fn upsert_triplet(&mut self, triplet: &Triplet) -> Result<UpsertReport> {
        triplet.validate()?;

        let keywords = (self.keyword_extractor)(triplet);
        Ok(self
            .upsert_with_embeddings(triplet, &keywords, &mut HashMap::new())
            .await)
    }

    async fn upsert_with_embeddings(
        &mut self,
        triplet: &Triplet,
        keywords: &[String],
        prefetched: &mut HashMap<String, Vec<f32>>,
    ) -> UpsertReport {
        let mut report = UpsertReport {
            new_edge: self.index_struct.upsert_triplet(triplet, keywords),
            ..UpsertReport::default()
        };

        let key = triplet.canonical_string();
        let needs_embedding = self
            .index_struct
            .embeddings
            .as_ref()
            .is_some_and(|table| !table.contains(&key));

        if needs_embedding {
            let embedding = match prefetched.remove(&key) {
                Some(embedding) => Ok(embedding),
                None => self.embed(&key).await,
            };
            match embedding {
                Ok(embedding) => {
                    if let Some(table) = self.index_struct.embeddings.as_mut() {
                        debug!("Stored {}-dim embedding for {}", embedding.len(), key);
                        report.embedded = table.insert(key, embedding);
                    }
                }
                Err(e) => {
                    warn!("Failed to embed {}: {}", key, e);
                    report.embedding_failure = Some(EmbeddingFailure {
                        triplet: key,
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// `add_node` with the triplet's keywords, then `upsert_triplet`.
    ///
    /// The triplet is validated before anything is stored.
    #[inline]
    pub async fn upsert_triplet_and_node(
        &mut self,
        triplet: &Triplet,
        chunk: &Chunk,
    ) -> Result<UpsertReport> {
        triplet.validate()?;

        let keywords = (self.keyword_extractor)(triplet);
        self.add_node(&keywords, chunk).await?;
        self.upsert_triplet(triplet).await
    }

    /// Split a document and index its chunks.
    ///
    /// A document indexed before with different chunks is replaced: its old
    /// chunks leave the docstore and the keyword table first. Re-inserting
    /// unchanged text is a no-op.
    #[inline]
    pub async fn insert_document(
        &mut self,
        document: &Document,
        chunking: &ChunkingConfig,
    ) -> Result<BuildReport> {
        let chunks = split_document(document, chunking);

        if self.document_changed(&document.id, &chunks).await? {
            info!(
                "Document {} changed since it was indexed, replacing its chunks",
                document.id
            );
            self.delete_ref_doc(&document.id, true).await?;
        }

        self.build_from_chunks(&document.id, chunks).await
    }

    async fn document_changed(&self, doc_id: &str, chunks: &[Chunk]) -> Result<bool> {
        let Some(info) = self.provenance.get(doc_id) else {
            return Ok(false);
        };

        if info.node_ids.len() != chunks.len()
            || chunks.iter().any(|chunk| !info.node_ids.contains(&chunk.id))
        {
            return Ok(true);
        }

        let ids: Vec<String> = chunks.iter().map(|chunk| chunk.id.clone()).collect();
        let stored = self.collaborators.docstore.get_many(&ids).await?;

        Ok(stored.len() != chunks.len()
            || stored
                .iter()
                .zip(chunks)
                .any(|(old, new)| old.text != new.text))
    }

    /// Index pre-split chunks belonging to `doc_id`.
    ///
    /// With extraction enabled each chunk's text goes through the extractor,
    /// several chunks at a time, and the parsed triplets are applied in chunk
    /// order. Without extraction every chunk is treated as yielding no
    /// triplets.
    #[inline]
    pub async fn build_from_chunks(
        &mut self,
        doc_id: &str,
        chunks: Vec<Chunk>,
    ) -> Result<BuildReport> {
        let chunks: Vec<Chunk> = chunks
            .into_iter()
            .map(|chunk| chunk.with_ref_doc_id(doc_id))
            .collect();
        let mut report = BuildReport {
            documents: 1,
            ..BuildReport::default()
        };

        if !self.settings.extract_triplets {
            for chunk in &chunks {
                self.apply_chunk(doc_id, chunk, &[], &mut report).await?;
            }
            info!(
                "Indexed document {} without extraction ({} chunks)",
                doc_id, report.chunks_indexed
            );
            return Ok(report);
        }

        let extractor = self.collaborators.extractor.clone().ok_or_else(|| {
            KgError::Config(
                "Triplet extraction is enabled but no extractor was provided".to_string(),
            )
        })?;
        let prompt = self.prompt.clone();
        let concurrency = self.settings.extraction_concurrency.max(1);

        debug!(
            "Extracting triplets from {} chunks of {} ({} at a time)",
            chunks.len(),
            doc_id,
            concurrency
        );

        let mut responses = stream::iter(chunks)
            .map(|chunk| {
                let extractor = Arc::clone(&extractor);
                let prompt = prompt.clone();
                async move {
                    let response = extractor.extract(&prompt, &chunk.text).await;
                    (chunk, response)
                }
            })
            .buffered(concurrency);

        while let Some((chunk, response)) = responses.next().await {
            match response {
                Ok(text) => {
                    let triplets = parse_triplet_response(&text);
                    debug!("Chunk {} yielded {} triplets", chunk.id, triplets.len());
                    self.apply_chunk(doc_id, &chunk, &triplets, &mut report)
                        .await?;
                }
                Err(e) => match self.settings.extraction_failure_policy {
                    ExtractionFailurePolicy::Abort => {
                        return Err(build_error(doc_id, &chunk.id, e));
                    }
                    ExtractionFailurePolicy::SkipChunk => {
                        warn!(
                            "Skipping chunk {} of {} after extraction failure: {}",
                            chunk.id, doc_id, e
                        );
                        report.failed_chunks.push(ChunkFailure {
                            doc_id: doc_id.to_string(),
                            chunk_id: chunk.id,
                            message: e.to_string(),
                        });
                    }
                },
            }
        }

        info!(
            "Indexed document {}: {} chunks, {} triplets",
            doc_id, report.chunks_indexed, report.triplets_upserted
        );
        Ok(report)
    }

    /// Index chunks with triplets the caller extracted already.
    ///
    /// Follows the same per-chunk rules as extraction, without calling the
    /// extractor.
    #[inline]
    pub async fn build_from_triplets(
        &mut self,
        doc_id: &str,
        items: Vec<(Chunk, Vec<Triplet>)>,
    ) -> Result<BuildReport> {
        let mut report = BuildReport {
            documents: 1,
            ..BuildReport::default()
        };

        for (chunk, triplets) in items {
            let chunk = chunk.with_ref_doc_id(doc_id);
            self.apply_chunk(doc_id, &chunk, &triplets, &mut report)
                .await?;
        }

        info!(
            "Indexed document {}: {} chunks, {} triplets",
            doc_id, report.chunks_indexed, report.triplets_upserted
        );
        Ok(report)
    }

    async fn apply_chunk(
        &mut self,
        doc_id: &str,
        chunk: &Chunk,
        triplets: &[Triplet],
        report: &mut BuildReport,
    ) -> Result<()> {
        if triplets.is_empty() {
            match self.settings.empty_chunk_policy {
                EmptyChunkPolicy::Keep => {
                    self.add_node(&[], chunk)
                        .await
                        .map_err(|e| build_error(doc_id, &chunk.id, e))?;
                    report.chunks_indexed += 1;
                }
                EmptyChunkPolicy::Skip => {
                    debug!("Skipping chunk {} with no triplets", chunk.id);
                    report.skipped_empty_chunks += 1;
                }
            }
            return Ok(());
        }

        if let Some(e) = triplets.iter().find_map(|t| t.validate().err()) {
            return Err(build_error(doc_id, &chunk.id, e));
        }

        let mut prefetched = self.prefetch_embeddings(triplets).await;

        for triplet in triplets {
            let keywords = (self.keyword_extractor)(triplet);
            self.add_node(&keywords, chunk)
                .await
                .map_err(|e| build_error(doc_id, &chunk.id, e))?;
            let upsert = self
                .upsert_with_embeddings(triplet, &keywords, &mut prefetched)
                .await;

            report.triplets_upserted += 1;
            if let Some(failure) = upsert.embedding_failure {
                report.embedding_failures.push(failure);
            }
        }

        report.chunks_indexed += 1;
        Ok(())
    }

    /// Embed a chunk's not-yet-embedded relations in one batch.
    ///
    /// Anything missing from the result is embedded one at a time during the
    /// upsert, which also reports per-relation failures.
    async fn prefetch_embeddings(&self, triplets: &[Triplet]) -> HashMap<String, Vec<f32>> {
        let (Some(table), Some(embed_model)) = (
            self.index_struct.embeddings.as_ref(),
            self.collaborators.embed_model.as_ref(),
        ) else {
            return HashMap::new();
        };

        let mut keys: Vec<String> = Vec::new();
        for key in triplets.iter().map(Triplet::canonical_string) {
            if !table.contains(&key) && !keys.contains(&key) {
                keys.push(key);
            }
        }
        if keys.is_empty() {
            return HashMap::new();
        }

        match embed_model.embed_batch(&keys).await {
            Ok(embeddings) if embeddings.len() == keys.len() => {
                debug!("Embedded {} relations in one batch", keys.len());
                keys.into_iter().zip(embeddings).collect()
            }
            Ok(embeddings) => {
                warn!(
                    "Batch embedding returned {} vectors for {} relations, embedding one at a time",
                    embeddings.len(),
                    keys.len()
                );
                HashMap::new()
            }
            Err(e) => {
                warn!("Batch embedding failed, embedding one at a time: {}", e);
                HashMap::new()
            }
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embed_model = self
            .collaborators
            .embed_model
            .as_ref()
            .ok_or_else(|| KgError::Embedding("No embedding model configured".to_string()))?;

        embed_model.embed(text).await
    }

    /// Chunk ids indexed under a keyword. Unknown keywords give an empty set.
    #[inline]
    pub fn lookup_by_keyword(&self, keyword: &str) -> BTreeSet<String> {
        self.index_struct
            .table
            .get(keyword)
            .cloned()
            .unwrap_or_default()
    }

    /// Edges leaving a subject. Unknown subjects give an empty set.
    #[inline]
    pub fn lookup_edges(&self, subject: &str) -> BTreeSet<(String, String)> {
        self.index_struct
            .triplets
            .edges(subject)
            .cloned()
            .unwrap_or_default()
    }

    /// Highest-scoring relations by cosine similarity to `query`.
    ///
    /// Ties keep insertion order. Fails when the index has no embedding
    /// table.
    #[inline]
    pub fn similar_relations(&self, query: &[f32], top_k: usize) -> Result<Vec<(String, f32)>> {
        let table = self.index_struct.embeddings.as_ref().ok_or_else(|| {
            KgError::Config("Relation embeddings are not enabled for this index".to_string())
        })?;

        Ok(top_k_similar(query, table.iter(), top_k))
    }

    /// Embed `text` with the index's model, then `similar_relations`
    #[inline]
    pub async fn similar_relations_to_text(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<(String, f32)>> {
        let query = self.embed(text).await?;
        self.similar_relations(&query, top_k)
    }

    #[inline]
    pub fn ref_doc_info(&self) -> &BTreeMap<String, RefDocInfo> {
        self.provenance.ref_doc_info()
    }

    /// Relation paths out of each subject, see [`TripletTable::rel_map`]
    #[inline]
    pub fn rel_map(
        &self,
        subjects: &[String],
        depth: usize,
        limit: usize,
    ) -> BTreeMap<String, Vec<Vec<String>>> {
        self.index_struct.triplets.rel_map(subjects, depth, limit)
    }

    #[inline]
    pub fn triplets(&self) -> impl Iterator<Item = Triplet> + '_ {
        self.index_struct.triplets.triplets()
    }

    #[inline]
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.index_struct.table.keywords()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.index_struct.node_ids.len()
    }

    #[inline]
    pub fn keyword_count(&self) -> usize {
        self.index_struct.table.len()
    }

    #[inline]
    pub fn embedding_table(&self) -> Option<&EmbeddingTable> {
        self.index_struct.embeddings.as_ref()
    }

    #[inline]
    pub async fn get_chunks(&self, ids: &[String]) -> Result<Vec<Chunk>> {
        self.collaborators.docstore.get_many(ids).await
    }

    /// Forget a source document.
    ///
    /// Its chunk ids leave the node set and every keyword set; keywords left
    /// without chunks are dropped. Edges stay. Returns false for an unknown
    /// document.
    #[inline]
    pub async fn delete_ref_doc(&mut self, doc_id: &str, delete_from_docstore: bool) -> Result<bool> {
        let Some(info) = self.provenance.get(doc_id) else {
            debug!("No provenance recorded for document {}", doc_id);
            return Ok(false);
        };
        let node_ids = info.node_ids.clone();

        if delete_from_docstore {
            for chunk_id in &node_ids {
                self.collaborators.docstore.delete(chunk_id).await?;
            }
        }

        self.provenance.remove(doc_id);
        let emptied = self.index_struct.remove_nodes(&node_ids);

        info!(
            "Deleted document {}: {} chunks, {} keywords dropped",
            doc_id,
            node_ids.len(),
            emptied.len()
        );
        Ok(true)
    }

    /// Write the index structures and provenance as JSON
    #[inline]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let persisted = PersistedIndexRef {
            version: INDEX_FORMAT_VERSION,
            index_struct: &self.index_struct,
            provenance: &self.provenance,
        };
        let json = serde_json::to_string_pretty(&persisted)
            .map_err(|e| KgError::Persistence(format!("Failed to serialize index: {}", e)))?;
        fs::write(path, json)?;

        info!(
            "Saved index with {} nodes and {} keywords to {}",
            self.node_count(),
            self.keyword_count(),
            path.display()
        );
        Ok(())
    }

    /// Read an index written by [`save`](Self::save)
    #[inline]
    pub fn load<P: AsRef<Path>>(
        path: P,
        settings: IndexConfig,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let persisted: PersistedIndex = serde_json::from_str(&content).map_err(|e| {
            KgError::Persistence(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        if persisted.version != INDEX_FORMAT_VERSION {
            return Err(KgError::Persistence(format!(
                "Unsupported index format version {} in {}",
                persisted.version,
                path.display()
            )));
        }

        let mut index = Self::new(settings, collaborators)?;
        let mut index_struct = persisted.index_struct;

        if index_struct.embeddings.is_none() && index.settings.include_embeddings {
            index_struct.embeddings = Some(EmbeddingTable::default());
        }
        if index_struct.embeddings.is_some() && index.collaborators.embed_model.is_none() {
            warn!("Index has relation embeddings but no embedding model; new triplets will not be embedded");
        }

        index.index_struct = index_struct;
        index.provenance = persisted.provenance;
        index.provenance.rebuild_owners();

        info!(
            "Loaded index with {} nodes and {} keywords from {}",
            index.node_count(),
            index.keyword_count(),
            path.display()
        );
        Ok(index)
    }

    /// `load` when the file exists, otherwise an empty index
    #[inline]
    pub fn load_or_new<P: AsRef<Path>>(
        path: P,
        settings: IndexConfig,
        collaborators: Collaborators,
    ) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path, settings, collaborators)
        } else {
            Self::new(settings, collaborators)
        }
    }
}

fn build_error(doc_id: &str, chunk_id: &str, source: KgError) -> KgError {
    KgError::Build {
        doc_id: doc_id.to_string(),
        chunk_id: chunk_id.to_string(),
        source: Box::new(source),
    }
}

fn chunk_owned_elsewhere(chunk_id: &str, owner: &str) -> KgError {
    KgError::Docstore(format!(
        "Chunk {} already belongs to document {}",
        chunk_id, owner
    ))
}
