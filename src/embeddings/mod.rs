// Embeddings module
// The embedding collaborator interface and relation similarity scoring


use async_trait::async_trait;

use crate::Result;

/// Anything that turns a string into a fixed-dimension vector.
///
/// The dimension is owned by the implementation; the index stores whatever
/// it returns.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several strings, one vector per input in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Compute cosine similarity between two vectors
///
/// Mismatched dimensions and zero vectors score 0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a < 1e-8 || norm_b < 1e-8 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Score every entry against `query` and keep the `top_k` best.
///
/// Equal scores keep their input order. A NaN score ranks below every
/// real score.
#[inline]
pub fn top_k_similar<'a, I>(query: &[f32], entries: I, top_k: usize) -> Vec<(String, f32)>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    let mut scored: Vec<(String, f32)> = entries
        .into_iter()
        .map(|(key, embedding)| {
            let score = match cosine_similarity(query, embedding) {
                score if score.is_nan() => f32::NEG_INFINITY,
                // -0.0 and 0.0 must tie under total_cmp
                score => score + 0.0,
            };
            (key.to_string(), score)
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);
    scored
}
