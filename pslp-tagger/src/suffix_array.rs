//! Enhanced suffix array over a (concatenated) protein string, with an LCP
//! array, a "next smaller LCP" skip table, and a mass-guided DFS walk (spec
//! §4.6, C6). Grounded on
//! `examples/original_source/include/OpenMS/DATASTRUCTURES/SuffixArraySeqan.h`'s
//! suffix-tree-over-suffix-array traversal, with the skip table load-bearing
//! for pruning subtrees whose running mass has already exceeded every target
//! (spec.md §9 supplemented feature).

use pslp_core::registry::ResidueTable;

/// A tryptic (or unconstrained) candidate found by [`EnhancedSuffixArray::search`].
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// The residue sequence read off the walked edges.
    pub sequence: String,
    /// Start offset of the matching suffix in the indexed text.
    pub start: usize,
    /// Neutral mass accumulated along the walk.
    pub mass: f64,
}

/// An enhanced suffix array: the sorted suffix array itself, its LCP array,
/// and a skip table giving, for each position, the next position whose LCP
/// value is strictly smaller — the standard "jump past this subtree" pruning
/// aid for a preorder DFS over the implicit suffix tree.
#[derive(Clone, Debug)]
pub struct EnhancedSuffixArray {
    text: Vec<u8>,
    sa: Vec<usize>,
    lcp: Vec<usize>,
    skip: Vec<usize>,
}

impl EnhancedSuffixArray {
    /// Build the suffix array (naive comparison sort; input sizes here are
    /// single concatenated protein databases, not whole genomes), its LCP
    /// array (Kasai's algorithm) and its next-smaller-LCP skip table.
    pub fn new(text: impl Into<String>) -> Self {
        let text: Vec<u8> = text.into().into_bytes();
        let n = text.len();
        let mut sa: Vec<usize> = (0..n).collect();
        sa.sort_by(|&a, &b| text[a..].cmp(&text[b..]));
        let lcp = kasai_lcp(&text, &sa);
        let skip = next_smaller_skip(&lcp);
        Self { text, sa, lcp, skip }
    }

    /// Number of suffixes indexed.
    pub fn len(&self) -> usize {
        self.sa.len()
    }

    /// True if the indexed text is empty.
    pub fn is_empty(&self) -> bool {
        self.sa.is_empty()
    }

    fn char_at(&self, suffix_start: usize, depth: usize) -> Option<char> {
        self.text.get(suffix_start + depth).map(|&b| b as char)
    }

    /// Partition `[lo, hi)` into contiguous groups of suffixes sharing the
    /// same character at `depth`, using the skip table to jump past
    /// same-group runs.
    fn child_ranges(&self, lo: usize, hi: usize, depth: usize) -> Vec<(char, (usize, usize))> {
        if hi <= lo {
            return Vec::new();
        }
        if hi - lo == 1 {
            return self
                .char_at(self.sa[lo], depth)
                .map(|c| vec![(c, (lo, hi))])
                .unwrap_or_default();
        }
        let mut children = Vec::new();
        let mut i = lo;
        while i < hi {
            let start = i;
            let mut j = i + 1;
            while j < hi && self.lcp[j] > depth {
                j = self.skip[j].min(hi).max(j + 1);
            }
            if let Some(c) = self.char_at(self.sa[start], depth) {
                children.push((c, (start, j.min(hi))));
            }
            i = j.max(start + 1);
        }
        children
    }

    fn is_tryptic_start(&self, suffix_start: usize) -> bool {
        if suffix_start == 0 {
            return true;
        }
        let before = self.text[suffix_start - 1] as char;
        let after = self.text[suffix_start] as char;
        ResidueTable::is_tryptic_site(before, after)
    }

    /// DFS the implicit suffix tree, accumulating residue mass edge by edge,
    /// and report every candidate whose accumulated mass matches one of
    /// `targets` within `tolerance`. In tryptic mode, only candidates whose
    /// predecessor/first-residue pair is a tryptic boundary survive. An
    /// optional tag filter restricts candidates to those containing at
    /// least one of the given substrings.
    ///
    /// Per spec.md §9: when several equal-mass children exist, the order
    /// candidates are reported in follows ascending edge-character order
    /// (ascending byte value) — callers must not depend on any particular
    /// ordering among equal-weight candidates.
    pub fn search(
        &self,
        targets: &[f64],
        tolerance: f64,
        table: &ResidueTable,
        tryptic: bool,
        tag_filter: Option<&[String]>,
    ) -> Vec<Candidate> {
        if targets.is_empty() || self.is_empty() {
            return Vec::new();
        }
        let max_target = targets.iter().copied().fold(f64::MIN, f64::max);

        struct Frame {
            lo: usize,
            hi: usize,
            depth: usize,
            mass: f64,
            label: String,
        }

        let mut out = Vec::new();
        let mut stack = vec![Frame {
            lo: 0,
            hi: self.sa.len(),
            depth: 0,
            mass: 0.0,
            label: String::new(),
        }];

        while let Some(frame) = stack.pop() {
            if frame.depth > 0 {
                if targets.iter().any(|&t| (frame.mass - t).abs() <= tolerance) {
                    for &idx in &self.sa[frame.lo..frame.hi] {
                        if tryptic && !self.is_tryptic_start(idx) {
                            continue;
                        }
                        if let Some(tags) = tag_filter {
                            if !tags.iter().any(|t| frame.label.contains(t.as_str())) {
                                continue;
                            }
                        }
                        out.push(Candidate {
                            sequence: frame.label.clone(),
                            start: idx,
                            mass: frame.mass,
                        });
                    }
                }
                // Residue masses are positive, so mass only grows deeper in
                // the tree: once it has passed every target plus tolerance,
                // no descendant can match and the whole subtree is pruned.
                if frame.mass > max_target + tolerance {
                    continue;
                }
            }
            let mut children = self.child_ranges(frame.lo, frame.hi, frame.depth);
            children.sort_by_key(|&(c, _)| c);
            for (residue, (lo, hi)) in children {
                if let Some(delta) = table.residue_mass(residue) {
                    stack.push(Frame {
                        lo,
                        hi,
                        depth: frame.depth + 1,
                        mass: frame.mass + delta,
                        label: format!("{}{residue}", frame.label),
                    });
                }
            }
        }
        out
    }
}

fn kasai_lcp(text: &[u8], sa: &[usize]) -> Vec<usize> {
    let n = text.len();
    let mut rank = vec![0usize; n];
    for (i, &s) in sa.iter().enumerate() {
        rank[s] = i;
    }
    let mut lcp = vec![0usize; n];
    let mut h = 0usize;
    for i in 0..n {
        if rank[i] > 0 {
            let j = sa[rank[i] - 1];
            while i + h < n && j + h < n && text[i + h] == text[j + h] {
                h += 1;
            }
            lcp[rank[i]] = h;
            h = h.saturating_sub(1);
        } else {
            h = 0;
        }
    }
    lcp
}

/// For each index `i`, the next index `j > i` with `lcp[j] < lcp[i]`
/// (`lcp.len()` if none), computed with a monotonic stack in linear time.
fn next_smaller_skip(lcp: &[usize]) -> Vec<usize> {
    let n = lcp.len();
    let mut skip = vec![n; n];
    let mut stack: Vec<usize> = Vec::new();
    for i in 0..n {
        while let Some(&top) = stack.last() {
            if lcp[top] > lcp[i] {
                skip[top] = i;
                stack.pop();
            } else {
                break;
            }
        }
        stack.push(i);
    }
    skip
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_tryptic_candidate_matching_target_mass() {
        let table = ResidueTable::standard();
        // "AKGAR": tryptic boundary after K (K|G) and at the very start.
        let esa = EnhancedSuffixArray::new("AKGAR");
        let target = table.residue_mass('G').unwrap() + table.residue_mass('A').unwrap();
        let candidates = esa.search(&[target], 1e-6, &table, true, None);
        assert!(candidates.iter().any(|c| c.sequence == "GA"));
    }

    #[test]
    fn tryptic_filter_rejects_non_boundary_start() {
        let table = ResidueTable::standard();
        let esa = EnhancedSuffixArray::new("AKGAR");
        let target = table.residue_mass('K').unwrap() + table.residue_mass('G').unwrap();
        // "KG" starts right after "A", not after a tryptic boundary.
        let candidates = esa.search(&[target], 1e-6, &table, true, None);
        assert!(!candidates.iter().any(|c| c.sequence == "KG"));
    }

    #[test]
    fn tag_filter_restricts_candidates() {
        let table = ResidueTable::standard();
        let esa = EnhancedSuffixArray::new("AKGAR");
        let target = table.residue_mass('G').unwrap() + table.residue_mass('A').unwrap();
        let tags = vec!["ZZ".to_string()];
        let candidates = esa.search(&[target], 1e-6, &table, false, Some(&tags));
        assert!(candidates.is_empty());
    }

    #[test]
    fn empty_targets_yields_no_candidates() {
        let table = ResidueTable::standard();
        let esa = EnhancedSuffixArray::new("AKGAR");
        assert!(esa.search(&[], 1.0, &table, false, None).is_empty());
    }
}
