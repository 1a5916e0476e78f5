#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::triplet::Triplet;

/// Keyword -> ids of the chunks the keyword participates in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordTable {
    table: BTreeMap<String, BTreeSet<String>>,
}

impl KeywordTable {
    /// Register a keyword without associating any chunk
    #[inline]
    pub fn ensure_keyword(&mut self, keyword: &str) {
        if !self.table.contains_key(keyword) {
            self.table.insert(keyword.to_string(), BTreeSet::new());
        }
    }

    /// Returns whether the chunk id was new for this keyword
    #[inline]
    pub fn add(&mut self, keyword: &str, chunk_id: &str) -> bool {
        self.table
            .entry(keyword.to_string())
            .or_default()
            .insert(chunk_id.to_string())
    }

    #[inline]
    pub fn get(&self, keyword: &str) -> Option<&BTreeSet<String>> {
        self.table.get(keyword)
    }

    #[inline]
    pub fn contains_keyword(&self, keyword: &str) -> bool {
        self.table.contains_key(keyword)
    }

    #[inline]
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Drop the given chunk ids everywhere, then drop keywords left with no
    /// chunks. Returns the removed keywords.
    #[inline]
    pub fn remove_chunks(&mut self, chunk_ids: &BTreeSet<String>) -> Vec<String> {
        let mut emptied = Vec::new();

        for (keyword, ids) in &mut self.table {
            let before = ids.len();
            ids.retain(|id| !chunk_ids.contains(id));
            if before > 0 && ids.is_empty() {
                emptied.push(keyword.clone());
            }
        }

        for keyword in &emptied {
            self.table.remove(keyword);
        }

        emptied
    }

    /// Union of every keyword's chunk ids
    #[inline]
    pub fn referenced_chunks(&self) -> BTreeSet<String> {
        self.table.values().flatten().cloned().collect()
    }
}

/// Subject -> (predicate, object) edges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripletTable {
    edges: BTreeMap<String, BTreeSet<(String, String)>>,
}

impl TripletTable {
    /// Returns whether the edge was new
    #[inline]
    pub fn insert(&mut self, triplet: &Triplet) -> bool {
        self.edges
            .entry(triplet.subject.clone())
            .or_default()
            .insert((triplet.predicate.clone(), triplet.object.clone()))
    }

    #[inline]
    pub fn edges(&self, subject: &str) -> Option<&BTreeSet<(String, String)>> {
        self.edges.get(subject)
    }

    #[inline]
    pub fn contains(&self, triplet: &Triplet) -> bool {
        self.edges.get(&triplet.subject).is_some_and(|edges| {
            edges.contains(&(triplet.predicate.clone(), triplet.object.clone()))
        })
    }

    /// Every stored triplet, ordered by subject then edge
    #[inline]
    pub fn triplets(&self) -> impl Iterator<Item = Triplet> + '_ {
        self.edges.iter().flat_map(|(subject, edges)| {
            edges
                .iter()
                .map(move |(predicate, object)| Triplet::new(subject, predicate, object))
        })
    }

    #[inline]
    pub fn subject_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Expand outward from each subject for up to `depth` hops.
    ///
    /// Each path is `[subject, predicate, object, predicate, object, ...]`.
    /// Paths never revisit a node, and at most `limit` paths are kept per
    /// subject. Subjects without edges are omitted.
    #[inline]
    pub fn rel_map(
        &self,
        subjects: &[String],
        depth: usize,
        limit: usize,
    ) -> BTreeMap<String, Vec<Vec<String>>> {
        let mut rel_map = BTreeMap::new();

        for subject in subjects {
            let mut paths: Vec<Vec<String>> = Vec::new();
            let mut frontier: Vec<(&str, Vec<String>)> = vec![(subject.as_str(), vec![subject.clone()])];

            'expand: for _ in 0..depth {
                let mut next = Vec::new();

                for (node, path) in frontier {
                    let Some(edges) = self.edges.get(node) else {
                        continue;
                    };

                    for (predicate, object) in edges {
                        if paths.len() >= limit {
                            break 'expand;
                        }
                        if path.iter().step_by(2).any(|seen| seen == object) {
                            continue;
                        }

                        let mut extended = path.clone();
                        extended.push(predicate.clone());
                        extended.push(object.clone());
                        paths.push(extended.clone());
                        next.push((object.as_str(), extended));
                    }
                }

                if next.is_empty() {
                    break;
                }
                frontier = next;
            }

            if !paths.is_empty() {
                rel_map.insert(subject.clone(), paths);
            }
        }

        rel_map
    }
}

/// One relation embedding, keyed by the canonical triplet string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingEntry {
    pub key: String,
    pub embedding: Vec<f32>,
}

/// Canonical triplet string -> embedding, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<EmbeddingEntry>", into = "Vec<EmbeddingEntry>")]
pub struct EmbeddingTable {
    entries: Vec<EmbeddingEntry>,
    positions: HashMap<String, usize>,
}

impl EmbeddingTable {
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&[f32]> {
        self.positions
            .get(key)
            .map(|&i| self.entries[i].embedding.as_slice())
    }

    /// Insert if absent. Returns whether the entry was new.
    #[inline]
    pub fn insert(&mut self, key: String, embedding: Vec<f32>) -> bool {
        if self.positions.contains_key(&key) {
            return false;
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push(EmbeddingEntry { key, embedding });
        true
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.embedding.as_slice()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<EmbeddingEntry>> for EmbeddingTable {
    #[inline]
    fn from(entries: Vec<EmbeddingEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            table.insert(entry.key, entry.embedding);
        }
        table
    }
}

impl From<EmbeddingTable> for Vec<EmbeddingEntry> {
    #[inline]
    fn from(table: EmbeddingTable) -> Self {
        table.entries
    }
}

/// The graph structures an index persists
///
/// All mutation here is plain set insertion, so every operation is
/// idempotent. Coordinating the tables with the docstore and provenance is
/// the index's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KgIndexStruct {
    pub table: KeywordTable,
    pub triplets: TripletTable,
    pub node_ids: BTreeSet<String>,
    /// Present only when relation embeddings are enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<EmbeddingTable>,
}

impl KgIndexStruct {
    #[inline]
    pub fn new(include_embeddings: bool) -> Self {
        Self {
            embeddings: include_embeddings.then(EmbeddingTable::default),
            ..Self::default()
        }
    }

    /// Index a chunk id under each keyword and record it as a node
    #[inline]
    pub fn add_node<S: AsRef<str>>(&mut self, keywords: &[S], chunk_id: &str) {
        for keyword in keywords {
            self.table.add(keyword.as_ref(), chunk_id);
        }
        self.node_ids.insert(chunk_id.to_string());
    }

    /// Register the triplet's keywords and store the edge. Keywords get no
    /// chunk ids here; that is `add_node`'s job. Returns whether the edge
    /// was new.
    #[inline]
    pub fn upsert_triplet<S: AsRef<str>>(&mut self, triplet: &Triplet, keywords: &[S]) -> bool {
        for keyword in keywords {
            self.table.ensure_keyword(keyword.as_ref());
        }
        self.triplets.insert(triplet)
    }

    /// Forget chunk ids in the node set and keyword table. Edges are kept.
    /// Returns the keywords that lost their last chunk.
    #[inline]
    pub fn remove_nodes(&mut self, chunk_ids: &BTreeSet<String>) -> Vec<String> {
        self.node_ids.retain(|id| !chunk_ids.contains(id));
        self.table.remove_chunks(chunk_ids)
    }
}
