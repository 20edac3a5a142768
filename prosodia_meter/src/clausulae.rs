// Prose rhythm classification: the clausula catalog and occurrence counts.
//
// A clausula is a short rhythmic shape at the end of a prose clause,
// written over the lowercase weight alphabet with `x` as the anceps final.
// The analyzer joins already-scanned texts into one search buffer and
// counts literal, non-overlapping occurrences of every catalog entry.
//
// The catalog is curated to be mutually exclusive; the counting algorithm
// does not enforce non-overlap across different entries (only within one
// entry's own matches). Overlapping matches across entries are accepted,
// matching reference behavior; see DESIGN.md.

use prosodia_lang::Clausula;

/// An ordered catalog of named prose rhythms.
#[derive(Debug, Clone)]
pub struct ClausulaCatalog {
    entries: Vec<Clausula>,
}

impl ClausulaCatalog {
    pub fn new(entries: Vec<Clausula>) -> Self {
        ClausulaCatalog { entries }
    }

    /// The standard 21-entry catalog: the classical clausulae with their
    /// resolved (long split into two shorts) variants.
    pub fn standard() -> Self {
        let entries = [
            ("cretic_trochee", "-u--x"),
            ("cretic_trochee_resolved_a", "uuu--x"),
            ("cretic_trochee_resolved_b", "-uuu-x"),
            ("cretic_trochee_resolved_c", "-u-uux"),
            ("double_cretic", "-u--ux"),
            ("double_cretic_resolved_a", "uuu--ux"),
            ("double_cretic_resolved_b", "-uuu-ux"),
            ("double_cretic_resolved_c", "-u-uuux"),
            ("molossus_cretic", "----ux"),
            ("molossus_cretic_resolved_a", "uu---ux"),
            ("molossus_cretic_resolved_b", "-uu--ux"),
            ("molossus_cretic_resolved_c", "--uu-ux"),
            ("molossus_cretic_resolved_d", "---uuux"),
            ("double_trochee", "-u-x"),
            ("double_trochee_resolved_a", "uuu-x"),
            ("double_trochee_resolved_b", "-uuux"),
            ("hypodochmiac", "-u-ux"),
            ("hypodochmiac_resolved_a", "uuu-ux"),
            ("hypodochmiac_resolved_b", "-uuuux"),
            ("spondaic", "---x"),
            ("heroic", "-uu-x"),
        ];
        ClausulaCatalog::new(
            entries
                .iter()
                .map(|(rhythm, pattern)| Clausula::new(rhythm, pattern))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[Clausula] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counts clausula occurrences across one or more scanned texts.
pub struct ClausulaeAnalyzer {
    catalog: ClausulaCatalog,
}

impl ClausulaeAnalyzer {
    pub fn new(catalog: ClausulaCatalog) -> Self {
        ClausulaeAnalyzer { catalog }
    }

    /// Analyzer over the standard catalog.
    pub fn standard() -> Self {
        ClausulaeAnalyzer::new(ClausulaCatalog::standard())
    }

    pub fn catalog(&self) -> &ClausulaCatalog {
        &self.catalog
    }

    /// Count occurrences of every catalog rhythm across the given scanned
    /// texts.
    ///
    /// The texts are space-joined into one buffer; each pattern is counted
    /// left to right with matches consumed, so a pattern never overlaps
    /// itself. The result always has one entry per catalog rhythm, in
    /// catalog order, zeros included.
    pub fn analyze<S: AsRef<str>>(&self, scanned: &[S]) -> Vec<(String, usize)> {
        let buffer = scanned
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        self.catalog
            .entries()
            .iter()
            .map(|c| (c.rhythm.clone(), count_occurrences(&buffer, &c.pattern)))
            .collect()
    }
}

/// Non-overlapping left-to-right substring count.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut from = 0;
    while let Some(at) = haystack[from..].find(needle) {
        count += 1;
        from += at + needle.len();
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_size() {
        assert_eq!(ClausulaCatalog::standard().len(), 21);
    }

    #[test]
    fn test_standard_catalog_patterns_distinct() {
        let catalog = ClausulaCatalog::standard();
        let mut patterns = std::collections::BTreeSet::new();
        for entry in catalog.entries() {
            assert!(
                patterns.insert(entry.pattern.clone()),
                "duplicate pattern {}",
                entry.pattern
            );
        }
    }

    #[test]
    fn test_count_occurrences_non_overlapping() {
        assert_eq!(count_occurrences("aaaa", "aa"), 2);
        assert_eq!(count_occurrences("----x", "---x"), 1);
        assert_eq!(count_occurrences("abc", "d"), 0);
        assert_eq!(count_occurrences("abc", ""), 0);
    }

    #[test]
    fn test_analyze_output_length_matches_catalog() {
        let analyzer = ClausulaeAnalyzer::standard();
        let counts = analyzer.analyze(&[""]);
        assert_eq!(counts.len(), 21);
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_analyze_single_pattern_buffer() {
        let analyzer = ClausulaeAnalyzer::standard();
        // A buffer that is exactly one catalog pattern and nothing else.
        let counts = analyzer.analyze(&["-u--x"]);
        for (rhythm, n) in counts {
            if rhythm == "cretic_trochee" {
                assert_eq!(n, 1);
            } else {
                assert_eq!(n, 0, "unexpected count for {rhythm}");
            }
        }
    }

    #[test]
    fn test_analyze_two_scanned_lines() {
        let analyzer = ClausulaeAnalyzer::standard();
        let counts = analyzer.analyze(&["-uuu-uuu-u--x", "uu-uu-uu----x"]);
        for (rhythm, n) in counts {
            match rhythm.as_str() {
                "cretic_trochee" | "spondaic" => assert_eq!(n, 1, "{rhythm}"),
                _ => assert_eq!(n, 0, "unexpected count for {rhythm}"),
            }
        }
    }

    #[test]
    fn test_analyze_custom_catalog_order_preserved() {
        let catalog = ClausulaCatalog::new(vec![
            Clausula::new("b_second", "--x"),
            Clausula::new("a_first", "-ux"),
        ]);
        let analyzer = ClausulaeAnalyzer::new(catalog);
        let counts = analyzer.analyze(&["--x -ux --x"]);
        assert_eq!(counts[0], ("b_second".to_string(), 2));
        assert_eq!(counts[1], ("a_first".to_string(), 1));
    }
}
