use thiserror::Error;

pub type Result<T> = std::result::Result<T, KgError>;

#[derive(Error, Debug)]
pub enum KgError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Docstore error: {0}")]
    Docstore(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Invalid triplet ({subject}, {predicate}, {object}): {reason}")]
    InvalidTriplet {
        subject: String,
        predicate: String,
        object: String,
        reason: String,
    },

    #[error("Failed to build document {doc_id} (chunk {chunk_id}): {source}")]
    Build {
        doc_id: String,
        chunk_id: String,
        #[source]
        source: Box<KgError>,
    },

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chunking;
pub mod commands;
pub mod config;
pub mod docstore;
pub mod embeddings;
pub mod extraction;
pub mod index;
pub mod ollama;
pub mod triplet;

pub use chunking::{ChunkingConfig, split_document};
pub use docstore::{Chunk, Docstore, Document, InMemoryDocstore, SqliteDocstore};
pub use embeddings::EmbeddingModel;
pub use extraction::{KeywordExtractor, PromptTemplate, TripletExtractor};
pub use index::{
    BuildReport, Collaborators, EmptyChunkPolicy, ExtractionFailurePolicy, KnowledgeGraphIndex,
};
pub use ollama::OllamaClient;
pub use triplet::{Triplet, parse_triplet_response};
