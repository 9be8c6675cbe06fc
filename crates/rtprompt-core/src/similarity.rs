//! Substring-bag similarity index.
//!
//! Every document is broken into the multiset of its substrings for a fixed
//! set of lengths. A query is scored against a document by the size of the
//! multiset intersection of their bags, which rewards shared runs of
//! characters regardless of where they appear.

use std::cmp::Reverse;
use std::collections::HashMap;

/// Substring lengths indexed by default
pub const DEFAULT_BAG_SIZES: [usize; 10] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

type Bag = HashMap<String, usize>;

/// Ranks documents by substring overlap with a query.
#[derive(Debug, Clone)]
pub struct SubstringIndex {
    bag_sizes: Vec<usize>,
    bags: Vec<Bag>,
}

impl SubstringIndex {
    /// Index `documents`, which are matched case-insensitively.
    pub fn new<I, S>(documents: I, bag_sizes: &[usize]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bags = documents
            .into_iter()
            .map(|doc| substring_bag(&doc.as_ref().to_lowercase(), bag_sizes))
            .collect();
        Self {
            bag_sizes: bag_sizes.to_vec(),
            bags,
        }
    }

    pub fn len(&self) -> usize {
        self.bags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bags.is_empty()
    }

    /// Score of every document against `query`, in document order.
    pub fn scores(&self, query: &str) -> Vec<usize> {
        let query = substring_bag(&query.to_lowercase(), &self.bag_sizes);
        self.bags.iter().map(|bag| overlap(&query, bag)).collect()
    }

    /// Indices of the `n` best matching documents, best first. Documents that
    /// share nothing with the query are left out; ties keep document order.
    pub fn closest_n(&self, query: &str, n: usize) -> Vec<usize> {
        let scores = self.scores(query);
        let mut ranked: Vec<usize> = (0..scores.len()).filter(|&id| scores[id] > 0).collect();
        // stable sort keeps document order among equal scores
        ranked.sort_by_key(|&id| Reverse(scores[id]));
        ranked.truncate(n);
        ranked
    }
}

fn substring_bag(s: &str, bag_sizes: &[usize]) -> Bag {
    let chars: Vec<char> = s.chars().collect();
    let mut bag = Bag::new();
    for &size in bag_sizes {
        if size == 0 || size > chars.len() {
            continue;
        }
        for window in chars.windows(size) {
            *bag.entry(window.iter().collect()).or_insert(0) += 1;
        }
    }
    bag
}

fn overlap(query: &Bag, doc: &Bag) -> usize {
    query
        .iter()
        .map(|(substring, &count)| count.min(doc.get(substring).copied().unwrap_or(0)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_bag_counts_repeats() {
        let bag = substring_bag("abab", &[1, 2, 3]);
        assert_eq!(bag.get("a"), Some(&2));
        assert_eq!(bag.get("ab"), Some(&2));
        assert_eq!(bag.get("ba"), Some(&1));
        assert_eq!(bag.get("aba"), Some(&1));
        assert_eq!(bag.get("abab"), None);
    }

    #[test]
    fn test_overlap_is_multiset_intersection() {
        let query = substring_bag("aa", &[1]);
        let one_a = substring_bag("ab", &[1]);
        let three_a = substring_bag("aaa", &[1]);
        assert_eq!(overlap(&query, &one_a), 1);
        assert_eq!(overlap(&query, &three_a), 2);
    }

    #[test]
    fn test_case_insensitive() {
        let index = SubstringIndex::new(["Panic"], &DEFAULT_BAG_SIZES);
        assert_eq!(index.scores("PANIC"), index.scores("panic"));
        assert!(index.scores("panic")[0] > 0);
    }

    #[test]
    fn test_closest_n_orders_by_score() {
        let index = SubstringIndex::new(
            ["apple pie", "banana split", "pineapple"],
            &DEFAULT_BAG_SIZES,
        );
        assert_eq!(index.closest_n("banana", 1), vec![1]);
        assert_eq!(index.closest_n("pineapple", 3)[0], 2);
    }

    #[test]
    fn test_ties_keep_document_order() {
        let index = SubstringIndex::new(["xa", "ya", "za"], &DEFAULT_BAG_SIZES);
        assert_eq!(index.closest_n("a", 3), vec![0, 1, 2]);
        assert_eq!(index.closest_n("a", 2), vec![0, 1]);
    }

    #[test]
    fn test_no_overlap_is_excluded() {
        let index = SubstringIndex::new(["abc", "def"], &DEFAULT_BAG_SIZES);
        assert_eq!(index.closest_n("xyz", 5), Vec::<usize>::new());
        assert_eq!(index.closest_n("", 5), Vec::<usize>::new());
    }
}
