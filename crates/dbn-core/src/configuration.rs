//! Partial assignments over the slots of one transition window.
//!
//! A window holds `(markov_lag + 1) * n` slots: slot `l * n + i` is node `i`
//! in the `l`-th slice of the window, and the last `n` slots are the present
//! slice. A slot is either a value code or unconstrained (`None`).

use std::fmt::Write as _;

use crate::attribute::AttributeDomain;

/// A partial assignment used as CPT key and matching pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Configuration {
    slots: Vec<Option<u32>>,
}

impl Configuration {
    /// All slots unconstrained.
    pub fn unconstrained(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn from_slots(slots: Vec<Option<u32>>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Option<u32>] {
        &self.slots
    }

    pub fn get(&self, slot: usize) -> Option<u32> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn set(&mut self, slot: usize, value: Option<u32>) {
        self.slots[slot] = value;
    }

    /// Every constrained slot equals the row's value at that slot.
    pub fn matches(&self, row: &[Option<u32>]) -> bool {
        self.slots
            .iter()
            .zip(row)
            .all(|(want, have)| want.is_none() || want == have)
    }

    /// CPT key for `child_slot` given sorted `parents`: parent slots copied,
    /// child slot pinned to 0, everything else unconstrained.
    pub fn mask(&self, parents: &[usize], child_slot: usize) -> Configuration {
        let mut key = vec![None; self.slots.len()];
        for &p in parents {
            key[p] = self.slots[p];
        }
        key[child_slot] = Some(0);
        Configuration { slots: key }
    }

    /// Human-readable `name[slice]=value` listing, skipping `skip_slot`.
    pub fn describe(&self, attributes: &[AttributeDomain], skip_slot: Option<usize>) -> String {
        let n = attributes.len().max(1);
        let mut out = String::from("[");
        let mut first = true;
        for (slot, value) in self.slots.iter().enumerate() {
            let Some(code) = value else { continue };
            if Some(slot) == skip_slot {
                continue;
            }
            let attribute = &attributes[slot % n];
            if !first {
                out.push_str(", ");
            }
            first = false;
            let _ = write!(
                out,
                "{}[{}]={}",
                attribute.name(),
                slot / n,
                attribute.value(*code).unwrap_or("?")
            );
        }
        out.push(']');
        out
    }
}

/// A configuration over one child and its parents that can enumerate every
/// parent and child value combination.
///
/// Parent slots are fixed at construction and kept sorted; enumeration is
/// mixed-radix with the lowest parent slot varying fastest.
#[derive(Debug, Clone)]
pub struct LocalConfiguration<'a> {
    attributes: &'a [AttributeDomain],
    config: Configuration,
    parents: Vec<usize>,
    child_slot: usize,
    consider_child: bool,
}

impl<'a> LocalConfiguration<'a> {
    /// `past_slots` are already-shifted window slots; `present_nodes` are
    /// node indices in the present slice. All values start at 0.
    pub fn new(
        attributes: &'a [AttributeDomain],
        markov_lag: usize,
        past_slots: &[usize],
        present_nodes: &[usize],
        child: usize,
    ) -> Self {
        let n = attributes.len();
        let mut parents: Vec<usize> = past_slots
            .iter()
            .copied()
            .chain(present_nodes.iter().map(|p| p + markov_lag * n))
            .collect();
        parents.sort_unstable();
        parents.dedup();

        let child_slot = markov_lag * n + child;
        let mut config = Configuration::unconstrained((markov_lag + 1) * n);
        for &p in &parents {
            config.set(p, Some(0));
        }
        config.set(child_slot, Some(0));

        Self {
            attributes,
            config,
            parents,
            child_slot,
            consider_child: true,
        }
    }

    fn domain_size(&self, slot: usize) -> usize {
        self.attributes[slot % self.attributes.len()].size()
    }

    /// When false, the child slot is ignored by [`matches`](Self::matches).
    pub fn set_consider_child(&mut self, consider: bool) {
        self.consider_child = consider;
    }

    pub fn matches(&self, row: &[Option<u32>]) -> bool {
        self.config
            .slots()
            .iter()
            .zip(row)
            .enumerate()
            .all(|(slot, (want, have))| {
                want.is_none()
                    || want == have
                    || (!self.consider_child && slot == self.child_slot)
            })
    }

    /// Advance to the next parent combination. Returns false (with parents
    /// reset to 0) once every combination has been visited.
    pub fn next_parents(&mut self) -> bool {
        for idx in 0..self.parents.len() {
            let slot = self.parents[idx];
            let next = self.config.get(slot).unwrap_or(0) + 1;
            if (next as usize) < self.domain_size(slot) {
                self.config.set(slot, Some(next));
                return true;
            }
            self.config.set(slot, Some(0));
        }
        false
    }

    pub fn reset_parents(&mut self) {
        for &p in &self.parents {
            self.config.set(p, Some(0));
        }
    }

    /// Advance the child value. Returns false (with the child reset to 0)
    /// once every value has been visited.
    pub fn next_child(&mut self) -> bool {
        let next = self.child_value() + 1;
        if (next as usize) < self.child_range() {
            self.config.set(self.child_slot, Some(next));
            true
        } else {
            self.reset_child();
            false
        }
    }

    pub fn reset_child(&mut self) {
        self.config.set(self.child_slot, Some(0));
    }

    pub fn child_value(&self) -> u32 {
        self.config.get(self.child_slot).unwrap_or(0)
    }

    /// Current parent values in parent-slot order.
    pub fn parent_values(&self) -> Vec<u32> {
        self.parents
            .iter()
            .map(|&p| self.config.get(p).unwrap_or(0))
            .collect()
    }

    /// Number of parent combinations (1 for a parentless child).
    pub fn parents_range(&self) -> usize {
        self.parents
            .iter()
            .fold(1usize, |acc, &p| acc.saturating_mul(self.domain_size(p)))
    }

    pub fn child_range(&self) -> usize {
        self.domain_size(self.child_slot)
    }

    /// Free parameters of the child's CPT.
    pub fn num_parameters(&self) -> usize {
        self.parents_range()
            .saturating_mul(self.child_range().saturating_sub(1))
    }

    /// CPT key of the current parent combination.
    pub fn key(&self) -> Configuration {
        self.config.mask(&self.parents, self.child_slot)
    }

    pub fn parent_slots(&self) -> &[usize] {
        &self.parents
    }

    pub fn child_slot(&self) -> usize {
        self.child_slot
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeDomain, AttributeKind};

    fn domains(sizes: &[usize]) -> Vec<AttributeDomain> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &k)| {
                AttributeDomain::with_values(
                    format!("X{}", i),
                    AttributeKind::Nominal,
                    (0..k).map(|v| v.to_string()),
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn parents_are_shifted_and_sorted() {
        let attrs = domains(&[2, 3, 2]);
        let c = LocalConfiguration::new(&attrs, 1, &[2, 0], &[1], 0);
        assert_eq!(c.parent_slots(), &[0, 2, 4]);
        assert_eq!(c.child_slot(), 3);
        assert_eq!(c.parents_range(), 2 * 2 * 3);
        assert_eq!(c.num_parameters(), 12);
    }

    #[test]
    fn enumeration_is_mixed_radix_lowest_first() {
        let attrs = domains(&[2, 3]);
        let mut c = LocalConfiguration::new(&attrs, 1, &[0, 1], &[], 0);
        let mut seen = vec![c.parent_values()];
        while c.next_parents() {
            seen.push(c.parent_values());
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], vec![0, 0]);
        assert_eq!(seen[1], vec![1, 0]);
        assert_eq!(seen[2], vec![0, 1]);
        assert_eq!(seen[5], vec![1, 2]);
        // wrapped back to the first combination
        assert_eq!(c.parent_values(), vec![0, 0]);
    }

    #[test]
    fn parentless_has_single_combination() {
        let attrs = domains(&[3]);
        let mut c = LocalConfiguration::new(&attrs, 1, &[], &[], 0);
        assert!(!c.next_parents());
        assert_eq!(c.parents_range(), 1);
        assert_eq!(c.num_parameters(), 2);
        let mut children = 1;
        while c.next_child() {
            children += 1;
        }
        assert_eq!(children, 3);
        assert_eq!(c.child_value(), 0);
    }

    #[test]
    fn matching_respects_consider_child() {
        let attrs = domains(&[2, 2]);
        let mut c = LocalConfiguration::new(&attrs, 1, &[0], &[], 1);
        let row = [Some(0), Some(1), Some(0), Some(1)];
        assert!(!c.matches(&row));
        assert!(c.next_child());
        assert!(c.matches(&row));
        c.reset_child();
        c.set_consider_child(false);
        assert!(c.matches(&row));
        // missing child never matches a constrained child slot
        c.set_consider_child(true);
        assert!(!c.matches(&[Some(0), Some(1), Some(0), None]));
    }

    #[test]
    fn mask_pins_child_and_keeps_parents() {
        let config = Configuration::from_slots(vec![Some(1), Some(0), Some(1), Some(1)]);
        let key = config.mask(&[0, 2], 3);
        assert_eq!(key.slots(), &[Some(1), None, Some(1), Some(0)]);
    }

    #[test]
    fn key_matches_mask_of_sampled_configuration() {
        let attrs = domains(&[2, 2]);
        let mut c = LocalConfiguration::new(&attrs, 1, &[1], &[0], 1);
        c.next_parents();
        let sampled = Configuration::from_slots(vec![Some(0), Some(1), Some(0), Some(1)]);
        assert_eq!(c.key(), sampled.mask(c.parent_slots(), c.child_slot()));
    }

    #[test]
    fn describe_names_slices() {
        let attrs = domains(&[2, 2]);
        let config = Configuration::from_slots(vec![Some(1), None, None, Some(0)]);
        assert_eq!(config.describe(&attrs, Some(3)), "[X0[0]=1]");
    }
}
