use std::collections::HashSet;
use std::sync::Arc;

use crate::triplet::Triplet;

/// Chooses the keywords a triplet's chunk is indexed under
pub type KeywordExtractor = Arc<dyn Fn(&Triplet) -> Vec<String> + Send + Sync>;

/// Subject and object, verbatim
#[inline]
pub fn default_keyword_extractor() -> KeywordExtractor {
    Arc::new(|triplet: &Triplet| vec![triplet.subject.clone(), triplet.object.clone()])
}

/// Subject and object, minus any that match a stopword (case-insensitive)
#[inline]
pub fn stopword_keyword_extractor<I, S>(stopwords: I) -> KeywordExtractor
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let stopwords: HashSet<String> = stopwords
        .into_iter()
        .map(|word| word.as_ref().to_lowercase())
        .collect();

    Arc::new(move |triplet: &Triplet| {
        [&triplet.subject, &triplet.object]
            .into_iter()
            .filter(|keyword| !stopwords.contains(&keyword.to_lowercase()))
            .cloned()
            .collect()
    })
}
