// Outcome histograms and fair/rigged alignment

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts per outcome value, sorted by value with unique keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeHistogram {
    bins: Vec<(u64, u64)>,
}

impl OutcomeHistogram {
    /// Build from unsorted `(value, count)` pairs; duplicate values are summed
    ///
    /// # Example
    /// ```
    /// use gacha_audit::distribution::OutcomeHistogram;
    ///
    /// let h = OutcomeHistogram::from_pairs([(3, 2), (1, 5), (3, 1)]);
    /// assert_eq!(h.bins(), &[(1, 5), (3, 3)]);
    /// assert_eq!(h.total(), 8);
    /// ```
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        let mut merged: BTreeMap<u64, u64> = BTreeMap::new();
        for (value, count) in pairs {
            let slot = merged.entry(value).or_insert(0);
            *slot = slot.saturating_add(count);
        }
        Self {
            bins: merged.into_iter().collect(),
        }
    }

    pub fn bins(&self) -> &[(u64, u64)] {
        &self.bins
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.bins
            .iter()
            .fold(0u64, |acc, &(_, c)| acc.saturating_add(c))
    }

    /// Count recorded for `value` (0 when absent)
    pub fn count_of(&self, value: u64) -> u64 {
        self.bins
            .binary_search_by_key(&value, |&(v, _)| v)
            .map(|i| self.bins[i].1)
            .unwrap_or(0)
    }

    /// Drop values above `max_value`; 0 disables the cap
    pub fn capped(&self, max_value: u64) -> Self {
        if max_value == 0 {
            return self.clone();
        }
        Self {
            bins: self
                .bins
                .iter()
                .copied()
                .filter(|&(v, _)| v <= max_value)
                .collect(),
        }
    }
}

/// A fair/rigged pair laid out over the union of their values
///
/// Values missing from one side are zero-filled so both count vectors are
/// index-aligned with `domain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignedPair {
    pub domain: Vec<u64>,
    pub fair: Vec<u64>,
    pub rigged: Vec<u64>,
}

impl AlignedPair {
    pub fn align(fair: &OutcomeHistogram, rigged: &OutcomeHistogram) -> Self {
        let mut domain: Vec<u64> = fair
            .bins()
            .iter()
            .chain(rigged.bins())
            .map(|&(v, _)| v)
            .collect();
        domain.sort_unstable();
        domain.dedup();

        let fair_counts = domain.iter().map(|&v| fair.count_of(v)).collect();
        let rigged_counts = domain.iter().map(|&v| rigged.count_of(v)).collect();

        Self {
            domain,
            fair: fair_counts,
            rigged: rigged_counts,
        }
    }

    pub fn len(&self) -> usize {
        self.domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }

    /// Restrict to the inclusive index span `[start, end]`
    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            domain: self.domain[start..=end].to_vec(),
            fair: self.fair[start..=end].to_vec(),
            rigged: self.rigged[start..=end].to_vec(),
        }
    }
}
