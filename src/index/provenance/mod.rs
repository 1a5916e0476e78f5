
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What the index knows about one source document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefDocInfo {
    pub node_ids: BTreeSet<String>,
}

/// Source document id -> the chunk ids it produced.
///
/// A chunk id belongs to at most one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceTracker {
    docs: BTreeMap<String, RefDocInfo>,
    #[serde(skip)]
    owners: BTreeMap<String, String>,
}

impl ProvenanceTracker {
    /// Record `chunk_id` under `doc_id`.
    ///
    /// Returns the document that already owns the chunk when it differs.
    #[inline]
    pub fn record(&mut self, doc_id: &str, chunk_id: &str) -> Result<(), String> {
        match self.owners.get(chunk_id) {
            Some(owner) if owner != doc_id => return Err(owner.clone()),
            Some(_) => return Ok(()),
            None => {}
        }

        self.owners.insert(chunk_id.to_string(), doc_id.to_string());
        self.docs
            .entry(doc_id.to_string())
            .or_default()
            .node_ids
            .insert(chunk_id.to_string());
        Ok(())
    }

    #[inline]
    pub fn owner_of(&self, chunk_id: &str) -> Option<&str> {
        self.owners.get(chunk_id).map(String::as_str)
    }

    #[inline]
    pub fn get(&self, doc_id: &str) -> Option<&RefDocInfo> {
        self.docs.get(doc_id)
    }

    #[inline]
    pub fn ref_doc_info(&self) -> &BTreeMap<String, RefDocInfo> {
        &self.docs
    }

    /// Drop a document, returning the chunk ids it owned
    #[inline]
    pub fn remove(&mut self, doc_id: &str) -> Option<RefDocInfo> {
        let info = self.docs.remove(doc_id)?;
        for chunk_id in &info.node_ids {
            self.owners.remove(chunk_id);
        }
        Some(info)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Recompute the chunk -> document lookup after deserializing
    #[inline]
    pub fn rebuild_owners(&mut self) {
        self.owners = self
            .docs
            .iter()
            .flat_map(|(doc_id, info)| {
                info.node_ids
                    .iter()
                    .map(move |chunk_id| (chunk_id.clone(), doc_id.clone()))
            })
            .collect();
    }
}
