//! Static source profiles and weights.
//!
//! Weights reflect data volume, update frequency, how directly a source
//! measures usage, and independence from the other sources.

use crate::models::SourceId;
use std::collections::BTreeMap;

/// Static description of one data source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceProfile {
    pub id: SourceId,
    pub weight: f64,
    pub description: &'static str,
    pub update_frequency: &'static str,
    pub data_size: &'static str,
    pub methodology: &'static str,
    pub strengths: &'static [&'static str],
    pub weaknesses: &'static [&'static str],
}

/// Profiles of all known sources, in processing order.
pub static SOURCE_PROFILES: [SourceProfile; 4] = [
    SourceProfile {
        id: SourceId::Githut,
        weight: 0.35,
        description: "GitHub Activity (Pull Requests, Pushes, Stars, Issues)",
        update_frequency: "quarterly",
        data_size: "very large (all GitHub repos)",
        methodology: "Direct measurement of code activity",
        strengths: &[
            "Actual code commits",
            "Large sample size",
            "Real project activity",
        ],
        weaknesses: &[
            "Biased toward open source",
            "Over-represents web technologies",
        ],
    },
    SourceProfile {
        id: SourceId::Tiobe,
        weight: 0.25,
        description: "Search Engine Query Analysis",
        update_frequency: "monthly",
        data_size: "very large (global search queries)",
        methodology: "Search engine mentions and tutorials",
        strengths: &[
            "Long history (since 2001)",
            "Global coverage",
            "Independent of GitHub",
        ],
        weaknesses: &["Measures interest, not usage", "Can be gamed"],
    },
    SourceProfile {
        id: SourceId::Pypl,
        weight: 0.20,
        description: "Google Trends Tutorial Searches",
        update_frequency: "monthly",
        data_size: "large (Google search data)",
        methodology: "Tutorial search frequency on Google",
        strengths: &["Learning intent indicator", "Good for emerging languages"],
        weaknesses: &["Only measures learning intent", "Regional bias"],
    },
    SourceProfile {
        id: SourceId::StackOverflow,
        weight: 0.20,
        description: "Stack Overflow Developer Survey",
        update_frequency: "yearly",
        data_size: "medium (~50,000 respondents)",
        methodology: "Self-reported usage survey",
        strengths: &["Direct developer feedback", "Includes sentiment data"],
        weaknesses: &[
            "Selection bias",
            "Less frequent updates",
            "English-speaking bias",
        ],
    },
];

impl SourceId {
    /// Static profile of this source.
    pub fn profile(&self) -> &'static SourceProfile {
        match self {
            SourceId::Githut => &SOURCE_PROFILES[0],
            SourceId::Tiobe => &SOURCE_PROFILES[1],
            SourceId::Pypl => &SOURCE_PROFILES[2],
            SourceId::StackOverflow => &SOURCE_PROFILES[3],
        }
    }
}

/// Source weights used for one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: BTreeMap<SourceId, f64>,
}

impl WeightTable {
    /// The standard weights from [`SOURCE_PROFILES`].
    pub fn standard() -> Self {
        SOURCE_PROFILES.iter().map(|p| (p.id, p.weight)).collect()
    }

    /// Configured weight of a source.
    pub fn weight(&self, id: SourceId) -> Option<f64> {
        self.weights.get(&id).copied()
    }

    /// Sum of the weights of the given sources.
    pub fn total_for<'a>(&self, ids: impl IntoIterator<Item = &'a SourceId>) -> f64 {
        ids.into_iter().filter_map(|id| self.weight(*id)).sum()
    }
}

impl FromIterator<(SourceId, f64)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (SourceId, f64)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_follow_processing_order() {
        for (profile, id) in SOURCE_PROFILES.iter().zip(SourceId::ALL) {
            assert_eq!(profile.id, id);
            assert_eq!(id.profile().id, id);
        }
    }

    #[test]
    fn test_standard_weights() {
        let table = WeightTable::standard();
        assert_eq!(table.weight(SourceId::Githut), Some(0.35));
        assert_eq!(table.weight(SourceId::Tiobe), Some(0.25));
        assert_eq!(table.weight(SourceId::Pypl), Some(0.20));
        assert_eq!(table.weight(SourceId::StackOverflow), Some(0.20));
        assert!((table.total_for(&SourceId::ALL) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_for_subset() {
        let table = WeightTable::standard();
        let total = table.total_for(&[SourceId::Githut, SourceId::Pypl]);
        assert!((total - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_custom_table() {
        let table: WeightTable = [(SourceId::Tiobe, 0.6)].into_iter().collect();
        assert_eq!(table.weight(SourceId::Tiobe), Some(0.6));
        assert_eq!(table.weight(SourceId::Pypl), None);
    }
}
