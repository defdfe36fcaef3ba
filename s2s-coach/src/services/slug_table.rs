//! Static problem-number → slug table
//!
//! Covers the commonly practiced interview set so those problems resolve
//! without a search round-trip. Numbers outside the table fall back to
//! the keyword search in the structured tier.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static SLUGS: &[(u32, &str)] = &[
    (1, "two-sum"),
    (2, "add-two-numbers"),
    (3, "longest-substring-without-repeating-characters"),
    (4, "median-of-two-sorted-arrays"),
    (5, "longest-palindromic-substring"),
    (7, "reverse-integer"),
    (9, "palindrome-number"),
    (11, "container-with-most-water"),
    (13, "roman-to-integer"),
    (15, "3sum"),
    (17, "letter-combinations-of-a-phone-number"),
    (19, "remove-nth-node-from-end-of-list"),
    (20, "valid-parentheses"),
    (21, "merge-two-sorted-lists"),
    (22, "generate-parentheses"),
    (23, "merge-k-sorted-lists"),
    (25, "reverse-nodes-in-k-group"),
    (33, "search-in-rotated-sorted-array"),
    (39, "combination-sum"),
    (42, "trapping-rain-water"),
    (46, "permutations"),
    (48, "rotate-image"),
    (49, "group-anagrams"),
    (53, "maximum-subarray"),
    (54, "spiral-matrix"),
    (55, "jump-game"),
    (56, "merge-intervals"),
    (62, "unique-paths"),
    (70, "climbing-stairs"),
    (72, "edit-distance"),
    (73, "set-matrix-zeroes"),
    (76, "minimum-window-substring"),
    (78, "subsets"),
    (79, "word-search"),
    (84, "largest-rectangle-in-histogram"),
    (91, "decode-ways"),
    (98, "validate-binary-search-tree"),
    (100, "same-tree"),
    (101, "symmetric-tree"),
    (102, "binary-tree-level-order-traversal"),
    (104, "maximum-depth-of-binary-tree"),
    (105, "construct-binary-tree-from-preorder-and-inorder-traversal"),
    (121, "best-time-to-buy-and-sell-stock"),
    (124, "binary-tree-maximum-path-sum"),
    (125, "valid-palindrome"),
    (128, "longest-consecutive-sequence"),
    (133, "clone-graph"),
    (139, "word-break"),
    (141, "linked-list-cycle"),
    (143, "reorder-list"),
    (146, "lru-cache"),
    (152, "maximum-product-subarray"),
    (153, "find-minimum-in-rotated-sorted-array"),
    (155, "min-stack"),
    (167, "two-sum-ii-input-array-is-sorted"),
    (190, "reverse-bits"),
    (191, "number-of-1-bits"),
    (198, "house-robber"),
    (200, "number-of-islands"),
    (206, "reverse-linked-list"),
    (207, "course-schedule"),
    (208, "implement-trie-prefix-tree"),
    (210, "course-schedule-ii"),
    (211, "design-add-and-search-words-data-structure"),
    (212, "word-search-ii"),
    (213, "house-robber-ii"),
    (217, "contains-duplicate"),
    (226, "invert-binary-tree"),
    (230, "kth-smallest-element-in-a-bst"),
    (235, "lowest-common-ancestor-of-a-binary-search-tree"),
    (238, "product-of-array-except-self"),
    (239, "sliding-window-maximum"),
    (242, "valid-anagram"),
    (252, "meeting-rooms"),
    (253, "meeting-rooms-ii"),
    (261, "graph-valid-tree"),
    (268, "missing-number"),
    (269, "alien-dictionary"),
    (271, "encode-and-decode-strings"),
    (283, "move-zeroes"),
    (295, "find-median-from-data-stream"),
    (297, "serialize-and-deserialize-binary-tree"),
    (300, "longest-increasing-subsequence"),
    (322, "coin-change"),
    (323, "number-of-connected-components-in-an-undirected-graph"),
    (338, "counting-bits"),
    (347, "top-k-frequent-elements"),
    (371, "sum-of-two-integers"),
    (417, "pacific-atlantic-water-flow"),
    (424, "longest-repeating-character-replacement"),
    (435, "non-overlapping-intervals"),
    (572, "subtree-of-another-tree"),
    (647, "palindromic-substrings"),
    (704, "binary-search"),
    (733, "flood-fill"),
    (743, "network-delay-time"),
];

static SLUG_MAP: Lazy<HashMap<u32, &'static str>> =
    Lazy::new(|| SLUGS.iter().copied().collect());

/// Slug for a problem number, if it is in the static table
pub fn slug_for(number: u32) -> Option<&'static str> {
    SLUG_MAP.get(&number).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_numbers() {
        assert_eq!(slug_for(1), Some("two-sum"));
        assert_eq!(slug_for(200), Some("number-of-islands"));
        assert_eq!(slug_for(99_999), None);
    }
}
