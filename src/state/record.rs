//! Person records as extracted from the genealogy directory
//!
//! The serialized field names match the snapshot and output format consumed
//! downstream, so they are kept short and snake_case rather than renamed.

use serde::{Deserialize, Serialize};

/// Dense integer key of a person in the genealogy directory
pub type NodeId = usize;

/// A resolved-present person record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Display name, whitespace-collapsed
    pub name: String,

    /// The record's own id
    pub id: NodeId,

    /// External author identifier, when the page links one
    pub msn_id: Option<u64>,

    /// Students listed on the page
    pub descendants: Vec<NodeId>,

    /// Degrees in page order
    pub degrees: Vec<Degree>,

    /// Ranking attributes attached by the enrichment merge
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,
}

impl Record {
    /// All ids this record refers to: descendants first, then every advisor
    /// of every degree. May contain duplicates.
    pub fn referenced_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants.iter().copied().chain(
            self.degrees
                .iter()
                .flat_map(|degree| degree.advisors.iter().map(|advisor| advisor.id)),
        )
    }

    /// The highest id this record refers to, if it refers to any
    pub fn max_referenced_id(&self) -> Option<NodeId> {
        self.referenced_ids().max()
    }
}

/// One degree entry of a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degree {
    /// Degree label, e.g. "Ph.D."
    pub degree: String,
    pub university: String,
    /// Year text as printed; may be empty or a range
    pub years: String,
    pub country: Vec<String>,
    pub dissertation: String,
    /// Subject classification code
    pub subject_id: Option<u32>,
    pub subject: String,
    pub advisors: Vec<Advisor>,
}

/// An advisor reference, serialized as a `[relation, id]` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, NodeId)", into = "(String, NodeId)")]
pub struct Advisor {
    /// Relation label, e.g. "Advisor 1"
    pub relation: String,
    pub id: NodeId,
}

impl From<(String, NodeId)> for Advisor {
    fn from((relation, id): (String, NodeId)) -> Self {
        Self { relation, id }
    }
}

impl From<Advisor> for (String, NodeId) {
    fn from(advisor: Advisor) -> Self {
        (advisor.relation, advisor.id)
    }
}

/// Popularity attributes merged into a record from the ranking source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    /// Knowledge-base entity number (the `Q` id without its prefix)
    pub wiki_id: u64,
    /// Number of sitelinks the entity has
    pub score: u64,
    /// English encyclopedia article, when one exists
    pub wiki_link: Option<String>,
}
