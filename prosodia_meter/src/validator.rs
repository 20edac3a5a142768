// Metrical pattern universes and validity checks.
//
// A meter admits a small finite set of weight patterns per syllable count:
// an n-syllable hexameter carries exactly n - 12 dactyls across its first
// five feet, a pentameter n - 12 across its first hemiepes, and the
// Phalaecian hendecasyllable is a single 11-syllable template. The
// validator enumerates those universes and answers membership queries; the
// scanner leans on it after every repair.
//
// Ordering contract: `hexameter_candidates` lists patterns with a dactylic
// fifth foot before spondaic-fifth ones (spondaic lines are real but rare),
// and within each group packs dactyls leftmost first. The scanner's
// closest-match tie-breaking depends on this order.

use prosodia_lang::ScansionProfile;
use smallvec::SmallVec;

/// Hexameter foot count excluding the ending foot.
const HEX_FEET: usize = 5;
/// Syllable count of an all-spondee hexameter.
pub const HEX_MIN: usize = 12;
/// Syllable count of an all-dactyl hexameter.
pub const HEX_MAX: usize = 17;
/// Syllable count of an all-spondee pentameter.
pub const PENT_MIN: usize = 12;
/// Syllable count of an all-dactyl pentameter.
pub const PENT_MAX: usize = 14;
/// The hendecasyllable admits exactly this count.
pub const HENDECA_LEN: usize = 11;

/// One valid pattern together with the feet that are dactyls.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    /// Zero-based indices of dactylic feet.
    pub dactyls: SmallVec<[u8; 5]>,
    /// The full weight pattern, ending with the optional-ending symbol.
    pub pattern: String,
}

/// Answers "is this weight string a valid line of meter X" and enumerates
/// the pattern universe for a given syllable count.
pub struct MetricalValidator<'a> {
    profile: &'a ScansionProfile,
}

impl<'a> MetricalValidator<'a> {
    pub fn new(profile: &'a ScansionProfile) -> Self {
        MetricalValidator { profile }
    }

    // -----------------------------------------------------------------------
    // Hexameter
    // -----------------------------------------------------------------------

    /// All valid hexameter patterns for an `n`-syllable line, dactylic
    /// fifth foot first, dactyls packed leftmost within each group.
    pub(crate) fn hexameter_candidates(&self, n: usize) -> Vec<Candidate> {
        if !(HEX_MIN..=HEX_MAX).contains(&n) {
            return Vec::new();
        }
        let dactyl_count = n - HEX_MIN;
        let mut with_fifth = Vec::new();
        let mut without_fifth = Vec::new();
        for dactyls in foot_subsets(HEX_FEET, dactyl_count) {
            let mut pattern = String::with_capacity(n);
            for foot in 0..HEX_FEET {
                if dactyls.contains(&(foot as u8)) {
                    pattern.push_str(&self.profile.dactyl());
                } else {
                    pattern.push_str(&self.profile.spondee());
                }
            }
            pattern.push_str(&self.profile.hexameter_ending());
            let candidate = Candidate { dactyls, pattern };
            if candidate.dactyls.contains(&4) {
                with_fifth.push(candidate);
            } else {
                without_fifth.push(candidate);
            }
        }
        with_fifth.extend(without_fifth);
        with_fifth
    }

    /// The hexameter pattern universe for `n` syllables, in candidate
    /// order.
    pub fn hexameter_patterns(&self, n: usize) -> Vec<String> {
        self.hexameter_candidates(n)
            .into_iter()
            .map(|c| c.pattern)
            .collect()
    }

    /// True when `pattern` (separators and whitespace ignored) is a fully
    /// resolved valid hexameter. The final syllable is metrically free.
    pub fn is_valid_hexameter(&self, pattern: &str) -> bool {
        let cleaned = self.clean(pattern);
        self.hexameter_candidates(cleaned.len())
            .iter()
            .any(|c| self.matches_with_free_final(&cleaned, &c.pattern))
    }

    // -----------------------------------------------------------------------
    // Pentameter
    // -----------------------------------------------------------------------

    /// All valid pentameter patterns for an `n`-syllable line: feet 1-2
    /// dactyl or spondee, a long hemiepes close, then the fixed dactylic
    /// second hemiepes and a free final. Dactyls packed leftmost first.
    pub(crate) fn pentameter_candidates(&self, n: usize) -> Vec<Candidate> {
        if !(PENT_MIN..=PENT_MAX).contains(&n) {
            return Vec::new();
        }
        let dactyl_count = n - PENT_MIN;
        foot_subsets(2, dactyl_count)
            .into_iter()
            .map(|dactyls| {
                let mut pattern = String::with_capacity(n);
                for foot in 0..2 {
                    if dactyls.contains(&(foot as u8)) {
                        pattern.push_str(&self.profile.dactyl());
                    } else {
                        pattern.push_str(&self.profile.spondee());
                    }
                }
                pattern.push(self.profile.stressed);
                pattern.push_str(&self.profile.dactyl());
                pattern.push_str(&self.profile.dactyl());
                pattern.push(self.profile.optional_ending);
                Candidate { dactyls, pattern }
            })
            .collect()
    }

    pub fn pentameter_patterns(&self, n: usize) -> Vec<String> {
        self.pentameter_candidates(n)
            .into_iter()
            .map(|c| c.pattern)
            .collect()
    }

    pub fn is_valid_pentameter(&self, pattern: &str) -> bool {
        let cleaned = self.clean(pattern);
        self.pentameter_candidates(cleaned.len())
            .iter()
            .any(|c| self.matches_with_free_final(&cleaned, &c.pattern))
    }

    // -----------------------------------------------------------------------
    // Hendecasyllable
    // -----------------------------------------------------------------------

    /// The canonical Phalaecian template with a spondaic aeolic base:
    /// base, dactyl, then trochaic close and free final.
    pub fn hendecasyllable_pattern(&self) -> String {
        let s = self.profile.stressed;
        let u = self.profile.unstressed;
        [s, s, s, u, u, s, u, s, u, s, self.profile.optional_ending]
            .iter()
            .collect()
    }

    /// True when `pattern` is a valid hendecasyllable. The two base
    /// positions and the final are free; positions 3-10 must match the
    /// template core.
    pub fn is_valid_hendecasyllable(&self, pattern: &str) -> bool {
        let cleaned = self.clean(pattern);
        if cleaned.len() != HENDECA_LEN {
            return false;
        }
        let template: Vec<char> = self.hendecasyllable_pattern().chars().collect();
        cleaned.iter().enumerate().all(|(i, &c)| {
            if i < 2 || i == HENDECA_LEN - 1 {
                self.is_weight_symbol(c)
            } else {
                c == template[i]
            }
        })
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    fn clean(&self, pattern: &str) -> Vec<char> {
        pattern
            .chars()
            .filter(|&c| c != self.profile.foot_separator && !c.is_whitespace())
            .collect()
    }

    fn is_weight_symbol(&self, c: char) -> bool {
        c == self.profile.stressed
            || c == self.profile.unstressed
            || c == self.profile.optional_ending
    }

    fn matches_with_free_final(&self, cleaned: &[char], universe: &str) -> bool {
        let universe: Vec<char> = universe.chars().collect();
        if cleaned.len() != universe.len() || cleaned.is_empty() {
            return false;
        }
        let last = cleaned.len() - 1;
        cleaned[..last] == universe[..last] && self.is_weight_symbol(cleaned[last])
    }
}

/// All size-`k` subsets of `0..feet`, in lexicographic order (dactyls
/// packed leftmost first).
fn foot_subsets(feet: usize, k: usize) -> Vec<SmallVec<[u8; 5]>> {
    let mut out = Vec::new();
    let mut current: SmallVec<[u8; 5]> = SmallVec::new();
    fn recurse(feet: usize, k: usize, start: usize, current: &mut SmallVec<[u8; 5]>, out: &mut Vec<SmallVec<[u8; 5]>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..feet {
            if feet - i < k - current.len() {
                break;
            }
            current.push(i as u8);
            recurse(feet, k, i + 1, current, out);
            current.pop();
        }
    }
    recurse(feet, k, 0, &mut current, &mut out);
    out
}
