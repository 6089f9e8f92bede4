//! Combinatorial enumeration used by parent-set search.

/// All `k`-subsets of `0..n` in lexicographic order.
pub fn k_subsets(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k > n {
        return out;
    }
    let mut comb: Vec<usize> = (0..k).collect();
    loop {
        out.push(comb.clone());

        // find the rightmost position that can still move right
        let mut target = k;
        while target > 0 {
            target -= 1;
            if comb[target] < n - k + target {
                comb[target] += 1;
                for i in target + 1..k {
                    comb[i] = comb[i - 1] + 1;
                }
                break;
            }
            if target == 0 {
                return out;
            }
        }
        if k == 0 {
            return out;
        }
    }
}

/// Candidate parent sets over `0..n` with at most `max_size` members.
///
/// The empty set comes first, then subsets by ascending size, each size in
/// lexicographic order.
pub fn bounded_subsets(n: usize, max_size: usize) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new()];
    for k in 1..=max_size.min(n) {
        out.extend(k_subsets(n, k));
    }
    out
}

/// Subsets of `items` with at most `max_size` members, in the order of
/// [`bounded_subsets`] over their positions. Each subset keeps the order
/// of `items`.
pub fn bounded_subsets_of<T: Clone>(items: &[T], max_size: usize) -> Vec<Vec<T>> {
    bounded_subsets(items.len(), max_size)
        .into_iter()
        .map(|idx| idx.into_iter().map(|j| items[j].clone()).collect())
        .collect()
}

/// Number of `k`-subsets of an `n`-set, saturating at `u64::MAX`.
pub fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * u128::from(n - i) / u128::from(i + 1);
        if acc > u128::from(u64::MAX) {
            return u64::MAX;
        }
    }
    acc as u64
}

/// Product of `radices`, or `None` on overflow.
pub fn checked_product(radices: &[usize]) -> Option<usize> {
    radices
        .iter()
        .try_fold(1usize, |acc, &r| acc.checked_mul(r))
}

/// Odometer over a mixed-radix space; digit 0 is least significant.
#[derive(Debug, Clone)]
pub struct MixedRadix {
    radices: Vec<usize>,
    digits: Vec<usize>,
    started: bool,
}

impl MixedRadix {
    pub fn new(radices: Vec<usize>) -> Self {
        let digits = vec![0; radices.len()];
        Self {
            radices,
            digits,
            started: false,
        }
    }

    /// Advance to the next assignment; returns `None` once exhausted.
    pub fn advance(&mut self) -> Option<&[usize]> {
        if !self.started {
            self.started = true;
            if self.radices.contains(&0) {
                return None;
            }
            return Some(&self.digits);
        }
        for i in 0..self.digits.len() {
            self.digits[i] += 1;
            if self.digits[i] < self.radices[i] {
                return Some(&self.digits);
            }
            self.digits[i] = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_subsets_lexicographic() {
        let s = k_subsets(4, 2);
        assert_eq!(
            s,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
    }

    #[test]
    fn k_subsets_edges() {
        assert_eq!(k_subsets(3, 0), vec![Vec::<usize>::new()]);
        assert!(k_subsets(2, 3).is_empty());
        assert_eq!(k_subsets(3, 3), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn bounded_subsets_empty_first() {
        let s = bounded_subsets(3, 2);
        assert_eq!(s[0], Vec::<usize>::new());
        assert_eq!(s[1], vec![0]);
        assert_eq!(s.len(), 1 + 3 + 3);
    }

    #[test]
    fn bounded_subsets_of_size_then_lexicographic() {
        let s = bounded_subsets_of(&['a', 'b', 'c'], 2);
        assert_eq!(s[0], Vec::<char>::new());
        assert_eq!(s[1], vec!['a']);
        assert_eq!(s[2], vec!['b']);
        assert_eq!(s[3], vec!['c']);
        assert_eq!(s[4], vec!['a', 'b']);
        assert_eq!(s[6], vec!['b', 'c']);
        assert_eq!(s.len(), 7);
        assert_eq!(bounded_subsets_of(&[1, 2], 0).len(), 1);
        assert_eq!(bounded_subsets_of::<u8>(&[], 3).len(), 1);
    }

    #[test]
    fn bounded_subsets_of_many_items() {
        let items: Vec<usize> = (0..70).collect();
        assert_eq!(bounded_subsets_of(&items, 1).len(), 71);
        let pairs = bounded_subsets_of(&items, 2);
        assert_eq!(pairs.len(), 1 + 70 + 2415);
        assert_eq!(pairs[70], vec![69]);
        assert_eq!(pairs[71], vec![0, 1]);
        assert_eq!(pairs.last(), Some(&vec![68, 69]));
    }

    #[test]
    fn binomial_values() {
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(10, 0), 1);
        assert_eq!(binomial(3, 4), 0);
    }

    #[test]
    fn mixed_radix_visits_every_assignment() {
        let mut odo = MixedRadix::new(vec![2, 3]);
        let mut seen = Vec::new();
        while let Some(d) = odo.advance() {
            seen.push(d.to_vec());
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], vec![0, 0]);
        assert_eq!(seen[1], vec![1, 0]);
        assert_eq!(seen[5], vec![1, 2]);
    }

    #[test]
    fn mixed_radix_empty_space_yields_one_assignment() {
        let mut odo = MixedRadix::new(Vec::new());
        assert!(odo.advance().is_some());
        assert!(odo.advance().is_none());
    }

    #[test]
    fn checked_product_overflow() {
        assert_eq!(checked_product(&[2, 3, 4]), Some(24));
        assert_eq!(checked_product(&[usize::MAX, 2]), None);
    }
}
