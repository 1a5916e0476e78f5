// Extraction module
// Prompt rendering, the language-model collaborator and keyword strategies


pub mod keywords;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{KgError, Result};

pub use keywords::{KeywordExtractor, default_keyword_extractor, stopword_keyword_extractor};

pub const DEFAULT_KG_TRIPLET_EXTRACT_TMPL: &str = "\
Some text is provided below. Given the text, extract up to {max_knowledge_triplets} \
knowledge triplets in the form of (subject, predicate, object). Avoid stopwords.
---------------------
Example:
Text: Alice is Bob's mother.
Triplets:
(Alice, is mother of, Bob)
Text: Philz is a coffee shop founded in Berkeley in 1982.
Triplets:
(Philz, is, coffee shop)
(Philz, founded in, Berkeley)
(Philz, founded in, 1982)
---------------------
Text: {text}
Triplets:
";

/// A prompt with `{text}` and optional `{max_knowledge_triplets}` placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    template: String,
    max_knowledge_triplets: usize,
}

impl Default for PromptTemplate {
    #[inline]
    fn default() -> Self {
        Self {
            template: DEFAULT_KG_TRIPLET_EXTRACT_TMPL.to_string(),
            max_knowledge_triplets: 10,
        }
    }
}

impl PromptTemplate {
    /// Fails when the template has no `{text}` placeholder
    #[inline]
    pub fn new(template: impl Into<String>, max_knowledge_triplets: usize) -> Result<Self> {
        let template = template.into();
        if !template.contains("{text}") {
            return Err(KgError::Prompt(
                "Template is missing the {text} placeholder".to_string(),
            ));
        }

        Ok(Self {
            template,
            max_knowledge_triplets,
        })
    }

    #[inline]
    pub fn with_max_knowledge_triplets(mut self, max_knowledge_triplets: usize) -> Self {
        self.max_knowledge_triplets = max_knowledge_triplets;
        self
    }

    #[inline]
    pub fn max_knowledge_triplets(&self) -> usize {
        self.max_knowledge_triplets
    }

    #[inline]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[inline]
    pub fn render(&self, text: &str) -> String {
        // Substitute the count first so chunk text containing the literal
        // placeholder is left alone.
        self.template
            .replace(
                "{max_knowledge_triplets}",
                &self.max_knowledge_triplets.to_string(),
            )
            .replace("{text}", text)
    }
}

/// The language-model collaborator producing raw triplet text for a chunk.
///
/// Timeouts are the implementation's business.
#[async_trait]
pub trait TripletExtractor: Send + Sync {
    async fn extract(&self, prompt: &PromptTemplate, chunk_text: &str) -> Result<String>;
}
