// Triplet module
// Subject-predicate-object facts and the parser for language-model responses

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::{KgError, Result};

/// A single `(subject, predicate, object)` fact. Identity is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triplet {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triplet {
    #[inline]
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// The embedding table key: `(subject, predicate, object)`, fields verbatim.
    #[inline]
    pub fn canonical_string(&self) -> String {
        format!("({}, {}, {})", self.subject, self.predicate, self.object)
    }

    /// Reject triplets with an empty field before they reach any table.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        let empty_field = [
            ("subject", &self.subject),
            ("predicate", &self.predicate),
            ("object", &self.object),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        match empty_field {
            Some((field, _)) => Err(KgError::InvalidTriplet {
                subject: self.subject.clone(),
                predicate: self.predicate.clone(),
                object: self.object.clone(),
                reason: format!("{} is empty", field),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Triplet {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

impl<S, P, O> From<(S, P, O)> for Triplet
where
    S: Into<String>,
    P: Into<String>,
    O: Into<String>,
{
    #[inline]
    fn from((subject, predicate, object): (S, P, O)) -> Self {
        Self::new(subject, predicate, object)
    }
}

/// Parse raw extraction output into triplets, preserving line order.
///
/// Each line may carry one parenthesized, comma-separated 3-tuple somewhere
/// inside it, e.g. `Here is one: (Jane, is mother of, Bob).` Lines that do
/// not decode into exactly three non-empty fields are skipped. Fields are split naively on `,`, so a field containing a comma makes the
/// line unparsable and it is skipped.
#[inline]
pub fn parse_triplet_response(response: &str) -> Vec<Triplet> {
    let triplets: Vec<Triplet> = response.lines().filter_map(parse_triplet_line).collect();

    debug!(
        "Parsed {} triplets from response of {} lines",
        triplets.len(),
        response.lines().count()
    );

    triplets
}

fn parse_triplet_line(line: &str) -> Option<Triplet> {
    let start = line.find('(')?;
    let end = line.rfind(')')?;
    if end <= start + 1 {
        return None;
    }

    let inner = line.get(start + 1..end)?;
    let fields: Vec<&str> = inner.split(',').map(str::trim).collect();

    match fields.as_slice() {
        [subject, predicate, object]
            if !subject.is_empty() && !predicate.is_empty() && !object.is_empty() =>
        {
            Some(Triplet::new(*subject, *predicate, *object))
        }
        _ => None,
    }
}
