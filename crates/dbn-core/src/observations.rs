//! Coded, weighted observations arranged as overlapping transition windows.
//!
//! `cells[t][s]` is the window of subject `s` for transition `t`: the
//! `markov_lag` past slices followed by the present slice, `n` slots each.
//! Consecutive windows of a subject overlap in `markov_lag * n` slots, so a
//! subject is equivalently a timeline of `num_transitions + markov_lag`
//! slices where window `t` starts at slice `t`.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::attribute::AttributeDomain;
use crate::configuration::LocalConfiguration;
use crate::error::{DbnError, Result};

/// Weighted observations for every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    attributes: Vec<AttributeDomain>,
    markov_lag: usize,
    cells: Vec<Vec<Vec<Option<u32>>>>,
    weights: Vec<Vec<f64>>,
}

impl Dataset {
    /// Observations with unit weights.
    pub fn new(
        attributes: Vec<AttributeDomain>,
        markov_lag: usize,
        cells: Vec<Vec<Vec<Option<u32>>>>,
    ) -> Result<Self> {
        let weights = cells.iter().map(|rows| vec![1.0; rows.len()]).collect();
        Self::with_weights(attributes, markov_lag, cells, weights)
    }

    pub fn with_weights(
        attributes: Vec<AttributeDomain>,
        markov_lag: usize,
        cells: Vec<Vec<Vec<Option<u32>>>>,
        weights: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let dataset = Self {
            attributes,
            markov_lag,
            cells,
            weights,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Observations coded as integers where any negative code is missing.
    pub fn from_coded(
        attributes: Vec<AttributeDomain>,
        markov_lag: usize,
        coded: &[Vec<Vec<i64>>],
    ) -> Result<Self> {
        let cells = coded
            .iter()
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.iter()
                            .map(|&v| u32::try_from(v).ok())
                            .collect::<Vec<_>>()
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        Self::new(attributes, markov_lag, cells)
    }

    /// A dataset with no transitions; scoring shell for random structures.
    pub fn empty(attributes: Vec<AttributeDomain>, markov_lag: usize) -> Self {
        Self {
            attributes,
            markov_lag,
            cells: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Cut equal-length subject timelines into transition windows.
    ///
    /// Each timeline holds `(T + markov_lag) * n` slots and yields `T`
    /// windows; `weights[s]` is copied to every window of subject `s`.
    pub fn from_timelines(
        attributes: Vec<AttributeDomain>,
        markov_lag: usize,
        timelines: &[Vec<Option<u32>>],
        weights: &[f64],
    ) -> Result<Self> {
        let n = attributes.len();
        let window = (markov_lag + 1) * n;
        let len = timelines.first().map_or(0, Vec::len);
        if weights.len() != timelines.len() {
            return Err(DbnError::WeightCountMismatch {
                transition: 0,
                rows: timelines.len(),
                weights: weights.len(),
            });
        }
        for (row, timeline) in timelines.iter().enumerate() {
            if timeline.len() != len || n == 0 || len % n != 0 || len < window {
                return Err(DbnError::RaggedRows {
                    transition: 0,
                    row,
                    expected: len.max(window),
                    actual: timeline.len(),
                });
            }
        }
        let num_transitions = if timelines.is_empty() {
            0
        } else {
            len / n - markov_lag
        };

        let mut cells = Vec::with_capacity(num_transitions);
        let mut window_weights = Vec::with_capacity(num_transitions);
        for t in 0..num_transitions {
            let start = t * n;
            cells.push(
                timelines
                    .iter()
                    .map(|tl| tl[start..start + window].to_vec())
                    .collect(),
            );
            window_weights.push(weights.to_vec());
        }
        Self::with_weights(attributes, markov_lag, cells, window_weights)
    }

    fn validate(&self) -> Result<()> {
        let expected = self.window_len();
        for (t, rows) in self.cells.iter().enumerate() {
            let weights = self.weights.get(t).map_or(0, Vec::len);
            if weights != rows.len() {
                return Err(DbnError::WeightCountMismatch {
                    transition: t,
                    rows: rows.len(),
                    weights,
                });
            }
            for (row, cells) in rows.iter().enumerate() {
                if cells.len() != expected {
                    return Err(DbnError::RaggedRows {
                        transition: t,
                        row,
                        expected,
                        actual: cells.len(),
                    });
                }
                for (slot, cell) in cells.iter().enumerate() {
                    if let Some(value) = *cell {
                        let domain_size = self.attributes[slot % self.attributes.len()].size();
                        if value as usize >= domain_size {
                            return Err(DbnError::InvalidValue {
                                slot,
                                value,
                                domain_size,
                            });
                        }
                    }
                }
                let weight = self.weights[t][row];
                if !weight.is_finite() || weight < 0.0 {
                    return Err(DbnError::InvalidWeight {
                        transition: t,
                        row,
                        weight,
                    });
                }
            }
        }
        if self.weights.len() != self.cells.len() {
            return Err(DbnError::WeightCountMismatch {
                transition: self.cells.len(),
                rows: 0,
                weights: self.weights.len(),
            });
        }
        Ok(())
    }

    pub fn attributes(&self) -> &[AttributeDomain] {
        &self.attributes
    }

    pub fn markov_lag(&self) -> usize {
        self.markov_lag
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.cells.len()
    }

    /// Rows of transition `t`; each row is one subject or, after soft
    /// completion, one weighted completion of a subject.
    pub fn num_subjects(&self, t: usize) -> usize {
        self.cells.get(t).map_or(0, Vec::len)
    }

    /// Slots per window: `(markov_lag + 1) * n`.
    pub fn window_len(&self) -> usize {
        (self.markov_lag + 1) * self.attributes.len()
    }

    pub fn rows(&self, t: usize) -> &[Vec<Option<u32>>] {
        &self.cells[t]
    }

    pub fn weights(&self, t: usize) -> &[f64] {
        &self.weights[t]
    }

    pub fn num_missing(&self, t: usize) -> usize {
        self.cells[t]
            .iter()
            .map(|row| row.iter().filter(|c| c.is_none()).count())
            .sum()
    }

    pub fn has_missing(&self) -> bool {
        (0..self.num_transitions()).any(|t| self.num_missing(t) > 0)
    }

    /// Sum of row weights of one transition, or of every transition.
    pub fn total_weight(&self, transition: Option<usize>) -> f64 {
        match transition {
            Some(t) => self.weights[t].iter().sum(),
            None => self.weights.iter().flatten().sum(),
        }
    }

    /// Past slots of each subject's first window; seeds for forecasting.
    pub fn first_window_past(&self) -> Vec<Vec<Option<u32>>> {
        let past = self.markov_lag * self.attributes.len();
        self.cells
            .first()
            .map(|rows| rows.iter().map(|row| row[..past].to_vec()).collect())
            .unwrap_or_default()
    }

    fn transitions(&self, transition: Option<usize>) -> std::ops::Range<usize> {
        match transition {
            Some(t) => t..t + 1,
            None => 0..self.num_transitions(),
        }
    }

    /// Total weight of rows matching `config` in one or every transition.
    pub fn count(&self, config: &LocalConfiguration<'_>, transition: Option<usize>) -> f64 {
        let mut total = 0.0;
        for t in self.transitions(transition) {
            for (row, weight) in self.cells[t].iter().zip(&self.weights[t]) {
                if config.matches(row) {
                    total += weight;
                }
            }
        }
        total
    }

    /// One-pass weighted counts of `child_slot` grouped by the values of
    /// `parent_slots`. Rows with a missing parent are skipped; rows with a
    /// missing child still count toward their parent total.
    pub fn statistics(
        &self,
        parent_slots: &[usize],
        child_slot: usize,
        transition: Option<usize>,
    ) -> SufficientStatistics {
        let child_range = self.attributes[child_slot % self.attributes.len()].size();
        let mut stats = SufficientStatistics {
            child_range,
            groups: HashMap::new(),
        };
        let mut key = Vec::with_capacity(parent_slots.len());
        for t in self.transitions(transition) {
            'rows: for (row, &weight) in self.cells[t].iter().zip(&self.weights[t]) {
                key.clear();
                for &p in parent_slots {
                    match row[p] {
                        Some(v) => key.push(v),
                        None => continue 'rows,
                    }
                }
                let group = stats
                    .groups
                    .entry(key.clone())
                    .or_insert_with(|| ParentGroup {
                        total: 0.0,
                        by_child: vec![0.0; child_range],
                    });
                group.total += weight;
                if let Some(v) = row[child_slot] {
                    group.by_child[v as usize] += weight;
                }
            }
        }
        stats
    }

    /// Slots per subject timeline: `(num_transitions + markov_lag) * n`.
    pub fn timeline_len(&self) -> usize {
        (self.num_transitions() + self.markov_lag) * self.attributes.len()
    }

    /// Checks every transition has as many rows as the first.
    pub fn ensure_even_subjects(&self) -> Result<usize> {
        let expected = self.num_subjects(0);
        for t in 1..self.num_transitions() {
            let actual = self.num_subjects(t);
            if actual != expected {
                return Err(DbnError::UnevenSubjects {
                    transition: t,
                    expected,
                    actual,
                });
            }
        }
        Ok(expected)
    }

    /// Timeline of row `s`: window `t` slot `k` lands at `t * n + k`. A
    /// cell is missing only when every window holding it leaves it missing;
    /// otherwise the earliest window's value is kept.
    pub fn subject_timeline(&self, s: usize) -> Vec<Option<u32>> {
        let n = self.attributes.len();
        let mut timeline = vec![None; self.timeline_len()];
        for t in 0..self.num_transitions() {
            for (k, cell) in self.cells[t][s].iter().enumerate() {
                let pos = t * n + k;
                if timeline[pos].is_none() {
                    timeline[pos] = *cell;
                }
            }
        }
        timeline
    }

    /// Copy of this dataset with missing values injected.
    ///
    /// `pct_subjects` percent of the subjects (rounded up) each lose
    /// `pct_cells` percent of a window's worth of cells (rounded up), drawn
    /// from their whole timeline; every window holding a chosen cell
    /// forgets it.
    pub fn generate_missing_values<R: Rng + ?Sized>(
        &self,
        pct_subjects: f64,
        pct_cells: f64,
        rng: &mut R,
    ) -> Result<Dataset> {
        let num_subjects = self.ensure_even_subjects()?;
        let n = self.attributes.len();
        let timeline_len = self.timeline_len();
        let subjects = ((pct_subjects.clamp(0.0, 100.0) / 100.0 * num_subjects as f64).ceil()
            as usize)
            .min(num_subjects);
        let cells_per_subject = ((pct_cells.clamp(0.0, 100.0) / 100.0 * self.window_len() as f64)
            .ceil() as usize)
            .min(timeline_len);

        let mut out = self.clone();
        for s in rand::seq::index::sample(rng, num_subjects, subjects).into_vec() {
            for pos in rand::seq::index::sample(rng, timeline_len, cells_per_subject).into_vec() {
                for t in 0..self.num_transitions() {
                    if pos >= t * n && pos < t * n + self.window_len() {
                        out.cells[t][s][pos - t * n] = None;
                    }
                }
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone)]
struct ParentGroup {
    total: f64,
    by_child: Vec<f64>,
}

/// Weighted counts of one child grouped by parent values.
#[derive(Debug, Clone)]
pub struct SufficientStatistics {
    child_range: usize,
    groups: HashMap<Vec<u32>, ParentGroup>,
}

impl SufficientStatistics {
    /// Weight of rows with these parent values, regardless of the child.
    pub fn parent_total(&self, parents: &[u32]) -> f64 {
        self.groups.get(parents).map_or(0.0, |g| g.total)
    }

    /// Weight of rows with these parent values and child value `child`.
    pub fn count(&self, parents: &[u32], child: u32) -> f64 {
        self.groups
            .get(parents)
            .and_then(|g| g.by_child.get(child as usize))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn child_range(&self) -> usize {
        self.child_range
    }

    /// Number of distinct parent combinations observed.
    pub fn observed_groups(&self) -> usize {
        self.groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn binary(n: usize) -> Vec<AttributeDomain> {
        (0..n)
            .map(|i| {
                AttributeDomain::with_values(format!("X{}", i), AttributeKind::Nominal, ["0", "1"])
                    .unwrap()
            })
            .collect()
    }

    fn two_transitions() -> Dataset {
        // subject 0 timeline: [0,1] [1,1] [0,0]
        // subject 1 timeline: [1,0] [1,1] [1,0]
        Dataset::from_coded(
            binary(2),
            1,
            &[
                vec![vec![0, 1, 1, 1], vec![1, 0, 1, 1]],
                vec![vec![1, 1, 0, 0], vec![1, 1, 1, 0]],
            ],
        )
        .unwrap()
    }

    #[test]
    fn shape_accessors() {
        let d = two_transitions();
        assert_eq!(d.num_transitions(), 2);
        assert_eq!(d.num_subjects(1), 2);
        assert_eq!(d.window_len(), 4);
        assert_eq!(d.timeline_len(), 6);
        assert_eq!(d.total_weight(None), 4.0);
        assert_eq!(d.first_window_past(), vec![vec![Some(0), Some(1)], vec![Some(1), Some(0)]]);
        assert!(!d.has_missing());
    }

    #[test]
    fn rejects_ragged_rows_and_bad_weights() {
        let err = Dataset::from_coded(binary(2), 1, &[vec![vec![0, 1, 1]]]).unwrap_err();
        assert!(matches!(err, DbnError::RaggedRows { expected: 4, .. }));

        let err = Dataset::with_weights(
            binary(1),
            1,
            vec![vec![vec![Some(0), Some(1)]]],
            vec![vec![f64::NAN]],
        )
        .unwrap_err();
        assert!(matches!(err, DbnError::InvalidWeight { .. }));

        let err = Dataset::from_coded(binary(1), 1, &[vec![vec![0, 2]]]).unwrap_err();
        assert!(matches!(err, DbnError::InvalidValue { value: 2, .. }));
    }

    #[test]
    fn count_matches_statistics() {
        let d = two_transitions();
        let attrs = d.attributes().to_vec();
        let mut c = LocalConfiguration::new(&attrs, 1, &[0], &[], 1);
        let stats = d.statistics(c.parent_slots(), c.child_slot(), None);
        loop {
            let parents = c.parent_values();
            loop {
                assert_eq!(d.count(&c, None), stats.count(&parents, c.child_value()));
                if !c.next_child() {
                    break;
                }
            }
            c.set_consider_child(false);
            assert_eq!(d.count(&c, None), stats.parent_total(&parents));
            c.set_consider_child(true);
            if !c.next_parents() {
                break;
            }
        }
    }

    #[test]
    fn missing_child_counts_toward_parent_total() {
        let d = Dataset::from_coded(binary(1), 1, &[vec![vec![0, -1], vec![0, 1]]]).unwrap();
        let stats = d.statistics(&[0], 1, Some(0));
        assert_eq!(stats.parent_total(&[0]), 2.0);
        assert_eq!(stats.count(&[0], 1), 1.0);
        assert_eq!(stats.count(&[0], 0), 0.0);
        assert_eq!(d.num_missing(0), 1);
    }

    #[test]
    fn timeline_merges_overlapping_windows() {
        let d = Dataset::from_coded(
            binary(1),
            1,
            &[vec![vec![0, -1]], vec![vec![1, 1]]],
        )
        .unwrap();
        // the present slot of window 0 is observed as the past of window 1
        assert_eq!(d.subject_timeline(0), vec![Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn timelines_round_trip() {
        let d = two_transitions();
        let timelines: Vec<_> = (0..2).map(|s| d.subject_timeline(s)).collect();
        let rebuilt = Dataset::from_timelines(d.attributes().to_vec(), 1, &timelines, &[1.0, 1.0])
            .unwrap();
        assert_eq!(rebuilt, d);
    }

    #[test]
    fn uneven_subjects_are_reported() {
        let d = Dataset::from_coded(binary(1), 1, &[vec![vec![0, 1]], vec![vec![1, 1], vec![0, 0]]])
            .unwrap();
        assert!(matches!(
            d.ensure_even_subjects(),
            Err(DbnError::UnevenSubjects { transition: 1, .. })
        ));
    }

    #[test]
    fn injected_missing_values_stay_consistent_across_windows() {
        let d = two_transitions();
        let mut rng = StdRng::seed_from_u64(11);
        let m = d.generate_missing_values(100.0, 50.0, &mut rng).unwrap();
        assert!(m.has_missing());
        for s in 0..2 {
            let missing = m.subject_timeline(s).iter().filter(|c| c.is_none()).count();
            assert_eq!(missing, 2);
        }
    }
}
