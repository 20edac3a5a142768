// The meter scanner: from weighted syllables to a canonical foot pattern.
//
// Input is one line of verse, pre-split and pre-weighted by the external
// syllabifier; each syllable is long, short, or ambiguous. The scanner
// resolves ambiguity positionally, then tries to place the line in the
// target meter's pattern universe, applying a fixed battery of repair
// heuristics in a documented order. Every heuristic that fires is recorded
// as a `ScanNote` on the resulting `VerseRecord`.
//
// The battery order is load-bearing: later heuristics assume earlier ones
// have already normalized the line. After every constructive repair the
// candidate is checked against the validator and accepted as soon as
// exactly one universe pattern is consistent with the known weights.
//
// Failure model: the scanner never panics and never returns an error.
// A line that defeats every repair comes back with `valid = false` and an
// explanatory note, with no forced pattern.
//
// The working line lives in a local slot buffer inside the scan call; the
// returned `VerseRecord` is frozen on construction and nothing
// intermediate escapes.

use crate::formatter::ScansionFormatter;
use crate::validator::{
    Candidate, HENDECA_LEN, HEX_MAX, HEX_MIN, MetricalValidator, PENT_MAX, PENT_MIN,
};
use prosodia_lang::{
    Meter, ScanNote, ScansionProfile, VerseRecord, Weight, WeightedSyllable, tables,
};
use smallvec::SmallVec;

/// Working weight buffer; hexameters cap at 17 syllables.
type Slots = SmallVec<[Weight; 17]>;

/// One syllable after positional resolution. Elided syllables stay in the
/// list (the macron aligner still has to walk their text) but carry no
/// weight slot.
#[derive(Debug, Clone)]
struct ResolvedSyllable {
    text: String,
    weight: Weight,
    word_final: bool,
    elided: bool,
}

/// Scans weighted syllable lines against a target meter.
pub struct MeterScanner<'a> {
    profile: &'a ScansionProfile,
}

impl<'a> MeterScanner<'a> {
    pub fn new(profile: &'a ScansionProfile) -> Self {
        MeterScanner { profile }
    }

    /// Scan one line. The sole entry point; all failure is expressed
    /// through `VerseRecord.valid`.
    pub fn scan(
        &self,
        original: &str,
        syllables: &[WeightedSyllable],
        meter: Meter,
    ) -> VerseRecord {
        if syllables.is_empty()
            || syllables.iter().any(|s| nucleus_index(&s.text).is_none())
        {
            // Garbage in: a syllable with no vowel violates the
            // syllabifier contract.
            let texts = syllables.iter().map(|s| s.text.clone()).collect();
            return self.invalid(original, texts, meter, vec![ScanNote::InvalidSyllables]);
        }
        match meter {
            Meter::Hexameter => self.scan_hexameter(original, syllables),
            Meter::Pentameter => self.scan_pentameter(original, syllables),
            Meter::Hendecasyllable => self.scan_hendecasyllable(original, syllables),
        }
    }

    // -----------------------------------------------------------------------
    // Hexameter
    // -----------------------------------------------------------------------

    fn scan_hexameter(&self, original: &str, syllables: &[WeightedSyllable]) -> VerseRecord {
        let mut notes = Vec::new();
        let (mut resolved, fired) = self.resolve_positionally(syllables);
        if fired {
            notes.push(ScanNote::Positionally);
        }
        let validator = MetricalValidator::new(self.profile);
        let mut slots = survivor_slots(&resolved);

        // Direct hit: the known weights already pin down a unique pattern.
        if let Some(pattern) = self.unique_consistent(&validator, slots.len(), &slots) {
            return self.finish(original, &resolved, &pattern, Meter::Hexameter, notes);
        }

        if (HEX_MIN..=HEX_MAX).contains(&slots.len()) {
            // Inverted amphibrachs: long-short-long cannot occur in any
            // valid hexameter, so the short is coerced long, to fixpoint.
            if fix_inverted(&mut slots) {
                notes.push(ScanNote::Inverted);
                if let Some(pattern) = self.unique_consistent(&validator, slots.len(), &slots) {
                    return self.finish(original, &resolved, &pattern, Meter::Hexameter, notes);
                }
            }

            // Feet opening with the invalid-foot shape become spondees.
            let conversions = self.fix_invalid_feet(&mut slots);
            if !conversions.is_empty() {
                notes.extend(conversions);
                if let Some(pattern) = self.unique_consistent(&validator, slots.len(), &slots) {
                    return self.finish(original, &resolved, &pattern, Meter::Hexameter, notes);
                }
            }

            // A 13-syllable line admits exactly one dactyl and it belongs
            // in the fifth foot; force that pattern when the evidence does
            // not already allow it.
            if slots.len() == 13 {
                let candidates = validator.hexameter_candidates(13);
                let consistent = consistent_candidates(&candidates, &slots, self.profile);
                if !consistent.iter().any(|c| c.dactyls.contains(&4)) {
                    notes.push(ScanNote::FifthDactyl);
                    let fifth = candidates
                        .iter()
                        .find(|c| c.dactyls.contains(&4))
                        .map(|c| c.pattern.clone())
                        .unwrap_or_default();
                    return self.finish(original, &resolved, &fifth, Meter::Hexameter, notes);
                }
            }
        }

        // Consonantal glide: a free-standing `i` between vowels is merged
        // into the following syllable and the line re-scanned.
        if slots.len() >= HEX_MIN && merge_i_glides(&mut resolved) {
            notes.push(ScanNote::IToJ);
            slots = survivor_slots(&resolved);
            if let Some(pattern) = self.unique_consistent(&validator, slots.len(), &slots) {
                return self.finish(original, &resolved, &pattern, Meter::Hexameter, notes);
            }
        }

        // Count-driven bailouts.
        let n = slots.len();
        match n {
            17 => {
                notes.push(ScanNote::SeventeenSyllables);
                let pattern = validator.hexameter_patterns(17).remove(0);
                return self.finish(original, &resolved, &pattern, Meter::Hexameter, notes);
            }
            12 => {
                notes.push(ScanNote::TwelveSyllables);
                let pattern = validator.hexameter_patterns(12).remove(0);
                return self.finish(original, &resolved, &pattern, Meter::Hexameter, notes);
            }
            _ if n < HEX_MIN => {
                notes.push(ScanNote::HexameterTooShort);
                return self.invalid(original, survivor_texts(&resolved), Meter::Hexameter, notes);
            }
            _ if n > HEX_MAX => {
                notes.push(ScanNote::HexameterTooLong);
                return self.invalid(original, survivor_texts(&resolved), Meter::Hexameter, notes);
            }
            _ => {}
        }

        let candidates = validator.hexameter_candidates(n);
        let consistent = consistent_candidates(&candidates, &slots, self.profile);

        // Chain smoothing: resolve residual ambiguity by propagating the
        // shape of a resolved foot through the ambiguous run.
        if consistent.len() >= 2 {
            let dactyl_count = n - HEX_MIN;
            if let Some(chosen) = chain_choice(&consistent, dactyl_count) {
                notes.push(chosen.0);
                return self.finish(original, &resolved, &chosen.1, Meter::Hexameter, notes);
            }
        }

        // Closest match: fall back to the nearest valid pattern. With
        // surviving consistent candidates the distance is zero and the
        // candidate order (dactylic fifth first, dactyls packed leftmost)
        // breaks the tie.
        notes.push(ScanNote::ClosestMatch);
        let best = consistent
            .first()
            .map(|c| c.pattern.clone())
            .or_else(|| closest_pattern(&candidates, &slots, self.profile));
        match best {
            Some(pattern) => self.finish(original, &resolved, &pattern, Meter::Hexameter, notes),
            None => {
                // No universe at all for this count: unreachable after the
                // bailouts, kept as the terminal repair.
                notes.pop();
                notes.push(ScanNote::InvalidSyllables);
                self.invalid(original, survivor_texts(&resolved), Meter::Hexameter, notes)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Pentameter
    // -----------------------------------------------------------------------

    fn scan_pentameter(&self, original: &str, syllables: &[WeightedSyllable]) -> VerseRecord {
        let mut notes = Vec::new();
        let (resolved, fired) = self.resolve_positionally(syllables);
        if fired {
            notes.push(ScanNote::Positionally);
        }
        let validator = MetricalValidator::new(self.profile);
        let slots = survivor_slots(&resolved);
        let n = slots.len();

        if n < PENT_MIN {
            notes.push(ScanNote::PentameterTooShort);
            return self.invalid(original, survivor_texts(&resolved), Meter::Pentameter, notes);
        }
        if n > PENT_MAX {
            notes.push(ScanNote::PentameterTooLong);
            return self.invalid(original, survivor_texts(&resolved), Meter::Pentameter, notes);
        }

        let candidates = validator.pentameter_candidates(n);
        match n {
            12 => {
                // Only the fully spondaic first hemiepes fits 12 syllables.
                notes.push(ScanNote::PentameterSpondaic);
                let pattern = candidates[0].pattern.clone();
                self.finish(original, &resolved, &pattern, Meter::Pentameter, notes)
            }
            14 => {
                notes.push(ScanNote::PentameterDactylic);
                let pattern = candidates[0].pattern.clone();
                self.finish(original, &resolved, &pattern, Meter::Pentameter, notes)
            }
            _ => {
                // 13 syllables: one dactyl, in either the first or second
                // foot. Known weights decide; otherwise closest match.
                let consistent = consistent_candidates(&candidates, &slots, self.profile);
                if consistent.len() == 1 {
                    let pattern = consistent[0].pattern.clone();
                    return self.finish(original, &resolved, &pattern, Meter::Pentameter, notes);
                }
                notes.push(ScanNote::ClosestMatch);
                let pattern = consistent
                    .first()
                    .map(|c| c.pattern.clone())
                    .or_else(|| closest_pattern(&candidates, &slots, self.profile))
                    .unwrap_or_default();
                self.finish(original, &resolved, &pattern, Meter::Pentameter, notes)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Hendecasyllable
    // -----------------------------------------------------------------------

    fn scan_hendecasyllable(
        &self,
        original: &str,
        syllables: &[WeightedSyllable],
    ) -> VerseRecord {
        let mut notes = Vec::new();
        let (resolved, fired) = self.resolve_positionally(syllables);
        if fired {
            notes.push(ScanNote::Positionally);
        }
        let mut slots = survivor_slots(&resolved);
        let n = slots.len();

        if n < HENDECA_LEN {
            notes.push(ScanNote::HendecasyllableTooShort);
            return self.invalid(original, survivor_texts(&resolved), Meter::Hendecasyllable, notes);
        }
        if n > HENDECA_LEN {
            notes.push(ScanNote::HendecasyllableTooLong);
            return self.invalid(original, survivor_texts(&resolved), Meter::Hendecasyllable, notes);
        }

        if !self.hendeca_consistent(&slots) {
            if fix_inverted(&mut slots) {
                notes.push(ScanNote::Inverted);
            }
            if !self.hendeca_consistent(&slots) {
                // Fixed template positions win over contradicting weights.
                notes.push(ScanNote::ClosestMatch);
            }
        }
        let pattern = self.hendeca_pattern(&slots);
        self.finish(original, &resolved, &pattern, Meter::Hendecasyllable, notes)
    }

    /// Known weights against the Phalaecian template; base and final are
    /// free.
    fn hendeca_consistent(&self, slots: &Slots) -> bool {
        let validator = MetricalValidator::new(self.profile);
        let template: Vec<char> = validator.hendecasyllable_pattern().chars().collect();
        slots.iter().enumerate().all(|(i, &w)| {
            if i < 2 || i == HENDECA_LEN - 1 {
                return true;
            }
            match w {
                Weight::Long => template[i] == self.profile.stressed,
                Weight::Short => template[i] == self.profile.unstressed,
                Weight::Ambiguous => true,
            }
        })
    }

    /// Render the template, filling the free base from known weights
    /// (defaulting to the canonical spondaic base).
    fn hendeca_pattern(&self, slots: &Slots) -> String {
        let validator = MetricalValidator::new(self.profile);
        let template: Vec<char> = validator.hendecasyllable_pattern().chars().collect();
        (0..HENDECA_LEN)
            .map(|i| {
                if i < 2 {
                    match slots[i] {
                        Weight::Short => self.profile.unstressed,
                        Weight::Long | Weight::Ambiguous => self.profile.stressed,
                    }
                } else {
                    template[i]
                }
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Positional resolution
    // -----------------------------------------------------------------------

    /// Resolve ambiguous weights by position: elision, length by position
    /// before consonant clusters, and shortening in hiatus. Returns the
    /// resolved syllables and whether any rule fired.
    fn resolve_positionally(
        &self,
        syllables: &[WeightedSyllable],
    ) -> (Vec<ResolvedSyllable>, bool) {
        let mut out = Vec::with_capacity(syllables.len());
        let mut fired = false;
        for (i, syl) in syllables.iter().enumerate() {
            let next = syllables.get(i + 1);
            if let Some(next) = next {
                if syl.word_final && ends_elidable(&syl.text) && starts_vocalic(&next.text) {
                    out.push(ResolvedSyllable {
                        text: syl.text.clone(),
                        weight: syl.weight,
                        word_final: syl.word_final,
                        elided: true,
                    });
                    fired = true;
                    continue;
                }
            }
            let mut weight = syl.weight;
            if weight == Weight::Ambiguous {
                if let Some(resolved) = self.positional_weight(syl, next) {
                    weight = resolved;
                    fired = true;
                }
            }
            out.push(ResolvedSyllable {
                text: syl.text.clone(),
                weight,
                word_final: syl.word_final,
                elided: false,
            });
        }
        (out, fired)
    }

    /// Purely positional weight of an ambiguous syllable, if any rule
    /// decides it.
    fn positional_weight(
        &self,
        syl: &WeightedSyllable,
        next: Option<&WeightedSyllable>,
    ) -> Option<Weight> {
        let cluster = consonant_cluster(&syl.text, next.map(|n| n.text.as_str()));
        if cluster.iter().any(|&c| tables::is_double_consonant(c)) {
            return Some(Weight::Long);
        }
        let effective = effective_consonants(&cluster);
        if effective.len() >= 2 {
            let mute_liquid = effective.len() == 2
                && tables::is_mute(effective[0])
                && tables::is_liquid(effective[1]);
            if !mute_liquid {
                return Some(Weight::Long);
            }
            return None;
        }
        // Hiatus inside a word: vowel before vowel is short, unless the
        // pair is a listed diphthong or the syllable is a compound prefix
        // (the boundary blocks shortening).
        if !syl.word_final {
            if let Some(next) = next {
                let last = last_vowel(&syl.text)?;
                let first = first_letter(&next.text)?;
                if tables::is_any_vowel(first)
                    && cluster.is_empty()
                    && !tables::is_diphthong(last, first)
                    && !is_listed_prefix(&syl.text)
                {
                    return Some(Weight::Short);
                }
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Repairs over the slot buffer
    // -----------------------------------------------------------------------

    /// Greedy left-to-right foot walk over determined slots, converting
    /// any foot that opens with the invalid-foot shape into a spondee.
    fn fix_invalid_feet(&self, slots: &mut Slots) -> Vec<ScanNote> {
        let n = slots.len();
        if n < HEX_MIN {
            return Vec::new();
        }
        let mut converted = Vec::new();
        let mut pos = 0;
        let mut foot = 0;
        while foot < 5 && pos + 2 <= n - 2 {
            match (slots[pos], slots[pos + 1]) {
                (Weight::Short, Weight::Short) => {
                    slots[pos] = Weight::Long;
                    slots[pos + 1] = Weight::Long;
                    converted.push(if foot == 0 {
                        ScanNote::InvalidStart
                    } else {
                        ScanNote::InvalidFoot
                    });
                    pos += 2;
                }
                (Weight::Long, Weight::Long) => pos += 2,
                (Weight::Long, Weight::Short) => {
                    if pos + 3 <= n - 2 && slots[pos + 2] == Weight::Short {
                        pos += 3;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
            foot += 1;
        }
        converted
    }

    /// Exactly one universe pattern consistent with the known weights.
    fn unique_consistent(
        &self,
        validator: &MetricalValidator<'_>,
        n: usize,
        slots: &Slots,
    ) -> Option<String> {
        let candidates = validator.hexameter_candidates(n);
        let consistent = consistent_candidates(&candidates, slots, self.profile);
        if consistent.len() == 1 {
            Some(consistent[0].pattern.clone())
        } else {
            None
        }
    }

    // -----------------------------------------------------------------------
    // Record construction
    // -----------------------------------------------------------------------

    fn finish(
        &self,
        original: &str,
        resolved: &[ResolvedSyllable],
        pattern: &str,
        meter: Meter,
        notes: Vec<ScanNote>,
    ) -> VerseRecord {
        let syllables = survivor_texts(resolved);
        let formatter = ScansionFormatter::new(self.profile);
        let accented = match align_marks(original, resolved, pattern) {
            Some(stress) => formatter
                .merge_with_text(original, &stress)
                .unwrap_or_else(|_| original.to_string()),
            None => {
                // The syllables do not spell out the line: a syllabifier
                // data error, same policy as the formatter's unmappable
                // characters.
                tracing::warn!(
                    line = %original,
                    "syllables do not align with the original text; \
                     leaving it unaccented"
                );
                original.to_string()
            }
        };
        VerseRecord {
            original: original.to_string(),
            scansion: pattern.to_string(),
            meter: Some(meter),
            valid: true,
            syllable_count: syllables.len(),
            accented,
            notes,
            syllables,
        }
    }

    fn invalid(
        &self,
        original: &str,
        syllables: Vec<String>,
        meter: Meter,
        notes: Vec<ScanNote>,
    ) -> VerseRecord {
        VerseRecord {
            original: original.to_string(),
            scansion: String::new(),
            meter: Some(meter),
            valid: false,
            syllable_count: syllables.len(),
            accented: original.to_string(),
            notes,
            syllables,
        }
    }
}

// ---------------------------------------------------------------------------
// Slot helpers
// ---------------------------------------------------------------------------

fn survivor_slots(resolved: &[ResolvedSyllable]) -> Slots {
    resolved
        .iter()
        .filter(|s| !s.elided)
        .map(|s| s.weight)
        .collect()
}

fn survivor_texts(resolved: &[ResolvedSyllable]) -> Vec<String> {
    resolved
        .iter()
        .filter(|s| !s.elided)
        .map(|s| s.text.clone())
        .collect()
}

/// Coerce every long-short-long window's short to long, to fixpoint.
fn fix_inverted(slots: &mut Slots) -> bool {
    let mut changed = false;
    loop {
        let mut hit = None;
        for i in 0..slots.len().saturating_sub(2) {
            if slots[i] == Weight::Long
                && slots[i + 1] == Weight::Short
                && slots[i + 2] == Weight::Long
            {
                hit = Some(i + 1);
                break;
            }
        }
        match hit {
            Some(i) => {
                slots[i] = Weight::Long;
                changed = true;
            }
            None => return changed,
        }
    }
}

/// Candidates whose pattern agrees with every known slot weight. The final
/// position is metrically free and never disqualifies.
fn consistent_candidates<'c>(
    candidates: &'c [Candidate],
    slots: &Slots,
    profile: &ScansionProfile,
) -> Vec<&'c Candidate> {
    candidates
        .iter()
        .filter(|c| pattern_distance(&c.pattern, slots, profile) == 0)
        .collect()
}

/// Number of known slots that contradict the pattern, final position
/// excluded. With equal lengths this is the edit distance between the
/// resolved portion of the line and the pattern.
fn pattern_distance(pattern: &str, slots: &Slots, profile: &ScansionProfile) -> usize {
    let chars: Vec<char> = pattern.chars().collect();
    debug_assert_eq!(chars.len(), slots.len());
    let last = slots.len().saturating_sub(1);
    slots
        .iter()
        .take(last)
        .zip(chars.iter())
        .filter(|&(&w, &p)| match w {
            Weight::Long => p != profile.stressed,
            Weight::Short => p != profile.unstressed,
            Weight::Ambiguous => false,
        })
        .count()
}

/// Minimum-distance pattern, ties broken by candidate order (dactylic
/// fifth foot first, then dactyls packed leftmost).
fn closest_pattern(
    candidates: &[Candidate],
    slots: &Slots,
    profile: &ScansionProfile,
) -> Option<String> {
    candidates
        .iter()
        .min_by_key(|c| pattern_distance(&c.pattern, slots, profile))
        .map(|c| c.pattern.clone())
}

/// Chain smoothing over the set of still-consistent candidates.
///
/// A foot is resolved when every consistent candidate agrees on its shape.
/// The chain heuristics extend a resolved foot's shape through the
/// neighboring ambiguous run:
/// - a resolved opening dactyl chains forward (dactyls packed leftmost);
/// - a resolved dactylic antepenult foot chains backward into it;
/// - a resolved dactylic fifth foot chains backward into it.
///
/// Returns the note and pattern, or `None` when no anchor exists or the
/// chained pattern is not among the consistent candidates.
fn chain_choice(consistent: &[&Candidate], dactyl_count: usize) -> Option<(ScanNote, String)> {
    let all_dactyl = |foot: u8| consistent.iter().all(|c| c.dactyls.contains(&foot));

    if all_dactyl(0) {
        // Forward from the opening foot: dactyls contiguous from foot 1.
        let target: Vec<u8> = (0..dactyl_count as u8).collect();
        if let Some(c) = consistent.iter().find(|c| c.dactyls.as_slice() == target.as_slice()) {
            return Some((ScanNote::DactylSmoothing, c.pattern.clone()));
        }
    }
    if all_dactyl(3) {
        // Backward from the antepenult foot: dactyls contiguous ending at
        // foot 3.
        let start = 4u8.saturating_sub(dactyl_count as u8);
        let target: Vec<u8> = (start..=3).collect();
        if let Some(c) = consistent.iter().find(|c| c.dactyls.as_slice() == target.as_slice()) {
            return Some((ScanNote::AntepenultChain, c.pattern.clone()));
        }
    }
    if all_dactyl(4) {
        // Backward from the fifth foot: dactyls contiguous ending at foot 5.
        let start = 5u8.saturating_sub(dactyl_count as u8);
        let target: Vec<u8> = (start..=4).collect();
        if let Some(c) = consistent.iter().find(|c| c.dactyls.as_slice() == target.as_slice()) {
            return Some((ScanNote::PenultimateDactylChain, c.pattern.clone()));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Orthography helpers
// ---------------------------------------------------------------------------

/// Lowercased, macron-stripped view of a character.
fn fold_char(c: char) -> char {
    let plain = tables::fold_accent(c);
    plain.to_lowercase().next().unwrap_or(plain)
}

fn first_letter(text: &str) -> Option<char> {
    text.chars().find(|c| c.is_alphabetic()).map(fold_char)
}

fn last_letter(text: &str) -> Option<char> {
    text.chars().rev().find(|c| c.is_alphabetic()).map(fold_char)
}

fn last_vowel(text: &str) -> Option<char> {
    text.chars()
        .rev()
        .map(fold_char)
        .find(|&c| tables::is_vowel(c))
}

/// True when the syllable can elide before a vocalic word: it ends in a
/// vowel or in `-m`.
fn ends_elidable(text: &str) -> bool {
    match last_letter(text) {
        Some('m') => true,
        Some(c) => tables::is_vowel(c),
        None => false,
    }
}

/// True when the word opens with a vowel or `h-`.
fn starts_vocalic(text: &str) -> bool {
    match first_letter(text) {
        Some('h') => true,
        Some(c) => tables::is_vowel(c),
        None => false,
    }
}

/// The consonant run between this syllable's last vowel and the next
/// syllable's first vowel, folded to lowercase.
fn consonant_cluster(syl: &str, next: Option<&str>) -> Vec<char> {
    let mut cluster: Vec<char> = Vec::new();
    let folded: Vec<char> = syl.chars().filter(|c| c.is_alphabetic()).map(fold_char).collect();
    let coda_start = folded
        .iter()
        .rposition(|&c| tables::is_vowel(c))
        .map_or(0, |i| i + 1);
    cluster.extend(&folded[coda_start..]);
    if let Some(next) = next {
        for c in next.chars().filter(|c| c.is_alphabetic()).map(fold_char) {
            if tables::is_vowel(c) {
                break;
            }
            cluster.push(c);
        }
    }
    cluster
}

/// Collapse digraphs for position counting: aspirate `h` extends the
/// previous mute, `u` after `q` is part of the digraph, and a bare `h`
/// never makes position.
fn effective_consonants(cluster: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(cluster.len());
    let mut prev: Option<char> = None;
    for &c in cluster {
        let absorbed = match (prev, c) {
            (Some('c' | 'p' | 't'), 'h') => true,
            (Some('q'), 'u') => true,
            (_, 'h') => true,
            _ => false,
        };
        if !absorbed {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// First match in the ordered prefix table; longest entries come first so
/// a longer prefix is never shadowed.
fn is_listed_prefix(text: &str) -> bool {
    let folded: String = text.chars().map(fold_char).collect();
    tables::PREFIXES.iter().any(|p| *p == folded)
}

/// Char index of the syllable's vocalic nucleus: the first vowel, skipping
/// glide `u` after `q` and glide `i` before another vowel; for a diphthong
/// the nucleus is its second element (the macron merger skips diphthongs
/// by looking at the preceding character, so a diphthong syllable is never
/// macronized).
fn nucleus_index(text: &str) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let folded = fold_char(c);
        if !tables::is_vowel(folded) {
            continue;
        }
        if folded == 'u' && i > 0 && fold_char(chars[i - 1]) == 'q' {
            continue;
        }
        if i + 1 < chars.len() && tables::is_diphthong(c, chars[i + 1]) {
            return Some(i + 1);
        }
        if folded == 'i'
            && chars
                .get(i + 1)
                .is_some_and(|&n| tables::is_vowel(fold_char(n)))
        {
            // Syllable-initial i before a vowel is the glide j.
            continue;
        }
        return Some(i);
    }
    None
}

/// Merge free-standing intervocalic `i` syllables into the following
/// syllable as a glide onset. Returns true when anything merged.
fn merge_i_glides(resolved: &mut Vec<ResolvedSyllable>) -> bool {
    let mut merged = false;
    let mut i = 0;
    while i < resolved.len() {
        if resolved[i].elided {
            i += 1;
            continue;
        }
        let candidate = {
            let syl = &resolved[i];
            let folded: String = syl.text.chars().map(fold_char).collect();
            folded == "i"
                && !syl.word_final
                && i > 0
                && !resolved[i - 1].word_final
                && last_letter(&resolved[i - 1].text)
                    .is_some_and(tables::is_vowel)
                && resolved
                    .get(i + 1)
                    .and_then(|n| first_letter(&n.text))
                    .is_some_and(tables::is_vowel)
        };
        if candidate {
            let glide = resolved.remove(i);
            resolved[i].text = format!("{}{}", glide.text, resolved[i].text);
            merged = true;
        } else {
            i += 1;
        }
    }
    merged
}

/// Build a char-aligned stress string for the original line: one mark per
/// surviving syllable, placed on the syllable's nucleus, blanks elsewhere.
/// Returns `None` when the syllables do not spell out the line (a
/// syllabifier contract violation; the caller falls back to the plain
/// text).
fn align_marks(original: &str, resolved: &[ResolvedSyllable], pattern: &str) -> Option<String> {
    let text: Vec<char> = original.chars().collect();
    let marks: Vec<char> = pattern.chars().collect();
    let mut stress = vec![' '; text.len()];
    let mut t = 0;
    let mut mark_idx = 0;
    for syl in resolved {
        while t < text.len() && !text[t].is_alphabetic() {
            t += 1;
        }
        let nucleus = nucleus_index(&syl.text);
        for (j, sc) in syl.text.chars().enumerate() {
            if !sc.is_alphabetic() {
                continue;
            }
            if t >= text.len() || fold_char(text[t]) != fold_char(sc) {
                return None;
            }
            if !syl.elided && nucleus == Some(j) {
                stress[t] = marks.get(mark_idx).copied().unwrap_or(' ');
            }
            t += 1;
        }
        if !syl.elided {
            mark_idx += 1;
        }
    }
    Some(stress.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prosodia_lang::Weight::{Ambiguous, Long, Short};

    fn syl(text: &str, weight: Weight) -> WeightedSyllable {
        WeightedSyllable::new(text, weight)
    }

    fn syl_f(text: &str, weight: Weight) -> WeightedSyllable {
        WeightedSyllable::word_final(text, weight)
    }

    /// Vergil, Aeneid 1.1 — the canonical opening hexameter.
    fn aeneid_1_1() -> (&'static str, Vec<WeightedSyllable>) {
        (
            "Arma virumque cano, Troiae quī prīmus ab ōrīs",
            vec![
                syl("ar", Ambiguous),
                syl_f("ma", Ambiguous),
                syl("vi", Ambiguous),
                syl("rum", Ambiguous),
                syl_f("que", Ambiguous),
                syl("ca", Ambiguous),
                syl_f("no", Ambiguous),
                syl("tro", Long),
                syl_f("iae", Long),
                syl_f("quī", Long),
                syl("prī", Long),
                syl_f("mus", Ambiguous),
                syl_f("ab", Ambiguous),
                syl("ō", Long),
                syl_f("rīs", Ambiguous),
            ],
        )
    }

    #[test]
    fn test_aeneid_opening_scans() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let (line, syllables) = aeneid_1_1();
        let record = scanner.scan(line, &syllables, Meter::Hexameter);
        assert!(record.valid, "notes: {:?}", record.notes);
        assert_eq!(record.scansion, "-UU-UU-----UU-X");
        assert_eq!(record.syllable_count, 15);
        assert_eq!(record.notes, vec![ScanNote::Positionally]);
    }

    #[test]
    fn test_valid_record_counts_agree() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let (line, syllables) = aeneid_1_1();
        let record = scanner.scan(line, &syllables, Meter::Hexameter);
        assert_eq!(record.scansion.chars().count(), record.syllable_count);
        assert_eq!(record.syllables.len(), record.syllable_count);
    }

    #[test]
    fn test_aeneid_opening_accented() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let (line, syllables) = aeneid_1_1();
        let record = scanner.scan(line, &syllables, Meter::Hexameter);
        // "tro" scans long so its vowel is macronized; the diphthong "ae"
        // and the vowel after "qu" are never marked.
        assert_eq!(record.accented, "Ārma virūmque canō, Trōiae quī prīmus ab ōrīs");
    }

    #[test]
    fn test_too_short_is_invalid_with_note() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let syllables = vec![
            syl("ar", Long),
            syl_f("ma", Short),
            syl("vi", Short),
            syl_f("rum", Long),
        ];
        let record = scanner.scan("arma virum", &syllables, Meter::Hexameter);
        assert!(!record.valid);
        assert!(record.scansion.is_empty(), "failure must not force a pattern");
        assert!(record.notes.contains(&ScanNote::HexameterTooShort));
        assert_eq!(record.notes.last().unwrap().to_string(), "< 12");
    }

    #[test]
    fn test_too_long_is_invalid_with_note() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let syllables: Vec<WeightedSyllable> =
            (0..18).map(|_| syl("ta", Ambiguous)).collect();
        let record = scanner.scan("ta ta ta", &syllables, Meter::Hexameter);
        assert!(!record.valid);
        assert!(record.notes.contains(&ScanNote::HexameterTooLong));
    }

    #[test]
    fn test_twelve_syllables_assumes_spondees() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // One contradicting short keeps the direct match from firing, so
        // the count bailout takes over.
        let mut syllables: Vec<WeightedSyllable> =
            (0..12).map(|_| syl("ta", Ambiguous)).collect();
        syllables[2] = syl("ta", Short);
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-----------X");
        assert!(record.notes.contains(&ScanNote::TwelveSyllables));
    }

    #[test]
    fn test_seventeen_syllables_assumes_dactyls() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let mut syllables: Vec<WeightedSyllable> =
            (0..17).map(|_| syl("li", Ambiguous)).collect();
        syllables[1] = syl("li", Long); // contradicts the all-dactyl line
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-UU-UU-UU-UU-UU-X");
        assert!(record.notes.contains(&ScanNote::SeventeenSyllables));
    }

    #[test]
    fn test_all_ambiguous_twelve_is_direct() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // Fully ambiguous 12-syllable line: the universe has exactly one
        // pattern, so it resolves directly with no bailout note.
        let syllables: Vec<WeightedSyllable> =
            (0..12).map(|_| syl("ta", Ambiguous)).collect();
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-----------X");
        assert!(record.notes.is_empty());
    }

    #[test]
    fn test_inverted_amphibrach_corrected() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // 12 syllables, long-short-long at the head: the short is coerced
        // and the line becomes the all-spondee hexameter.
        let mut syllables: Vec<WeightedSyllable> =
            (0..12).map(|_| syl("ta", Ambiguous)).collect();
        syllables[0] = syl("ta", Long);
        syllables[1] = syl("ta", Short);
        syllables[2] = syl("ta", Long);
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-----------X");
        assert!(record.notes.contains(&ScanNote::Inverted));
    }

    #[test]
    fn test_invalid_start_converted() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // Opening pyrrhic in a 12-syllable line.
        let mut syllables: Vec<WeightedSyllable> =
            (0..12).map(|_| syl("ta", Ambiguous)).collect();
        syllables[0] = syl("ta", Short);
        syllables[1] = syl("ta", Short);
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-----------X");
        assert!(record.notes.contains(&ScanNote::InvalidStart));
    }

    #[test]
    fn test_fifth_foot_forced_to_dactyl() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // 13 syllables with a long blocking the fifth-foot dactyl: the
        // repair forces the canonical 13-syllable pattern anyway.
        let mut syllables: Vec<WeightedSyllable> =
            (0..13).map(|_| syl("ta", Ambiguous)).collect();
        syllables[9] = syl("ta", Long);
        syllables[10] = syl("ta", Long);
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "---------UU-X");
        assert!(record.notes.contains(&ScanNote::FifthDactyl));
    }

    #[test]
    fn test_dactyl_smoothing_chain() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // 14 syllables, two dactyls somewhere. Shorts at 1-2 pin the first
        // foot as a dactyl; the second dactyl chains on right after it.
        let mut syllables: Vec<WeightedSyllable> =
            (0..14).map(|_| syl("ta", Ambiguous)).collect();
        syllables[1] = syl("ta", Short);
        syllables[2] = syl("ta", Short);
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-UU-UU-------X");
        assert!(record.notes.contains(&ScanNote::DactylSmoothing));
    }

    #[test]
    fn test_antepenult_chain() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // Shorts at 8-9 leave only patterns with a dactylic fourth foot;
        // the remaining dactyl chains backward into it.
        let mut syllables: Vec<WeightedSyllable> =
            (0..14).map(|_| syl("ta", Ambiguous)).collect();
        syllables[8] = syl("ta", Short);
        syllables[9] = syl("ta", Short);
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-----UU-UU---X");
        assert!(record.notes.contains(&ScanNote::AntepenultChain));
    }

    #[test]
    fn test_penultimate_dactyl_chain() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // Shorts at 10-11 leave only patterns with a dactylic fifth foot;
        // the remaining dactyl chains backward into it.
        let mut syllables: Vec<WeightedSyllable> =
            (0..14).map(|_| syl("ta", Ambiguous)).collect();
        syllables[10] = syl("ta", Short);
        syllables[11] = syl("ta", Short);
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-------UU-UU-X");
        assert!(record.notes.contains(&ScanNote::PenultimateDactylChain));
    }

    #[test]
    fn test_closest_match_when_nothing_fits() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // 14 syllables whose shorts fit no valid pattern after repairs:
        // the nearest valid pattern is still produced, with the note.
        let mut syllables: Vec<WeightedSyllable> =
            (0..14).map(|_| syl("ta", Ambiguous)).collect();
        syllables[1] = syl("ta", Short);
        syllables[2] = syl("ta", Short);
        syllables[3] = syl("ta", Short);
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert!(record.notes.contains(&ScanNote::ClosestMatch));
        let v = MetricalValidator::new(&profile);
        assert!(v.is_valid_hexameter(&record.scansion));
        assert_eq!(record.scansion.chars().count(), 14);
    }

    #[test]
    fn test_elision_drops_syllable() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // "multum ille": the -um elides before i-. 13 raw syllables fall
        // to 12 surviving ones.
        let mut syllables = vec![
            syl("mul", Ambiguous),
            syl_f("tum", Ambiguous),
            syl("il", Ambiguous),
        ];
        syllables.extend((0..10).map(|_| syl("ta", Ambiguous)));
        let record = scanner.scan("", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.syllable_count, 12);
        assert!(record.notes.contains(&ScanNote::Positionally));
    }

    #[test]
    fn test_i_to_j_merge() {
        let mut resolved = vec![
            ResolvedSyllable {
                text: "tro".to_string(),
                weight: Weight::Ambiguous,
                word_final: false,
                elided: false,
            },
            ResolvedSyllable {
                text: "i".to_string(),
                weight: Weight::Ambiguous,
                word_final: false,
                elided: false,
            },
            ResolvedSyllable {
                text: "ae".to_string(),
                weight: Weight::Long,
                word_final: true,
                elided: false,
            },
        ];
        assert!(merge_i_glides(&mut resolved));
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[1].text, "iae");
        assert_eq!(resolved[1].weight, Weight::Long);
    }

    #[test]
    fn test_pentameter_counts() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);

        let twelve: Vec<WeightedSyllable> =
            (0..12).map(|_| syl("ta", Ambiguous)).collect();
        let record = scanner.scan("", &twelve, Meter::Pentameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "------UU-UUX");
        assert!(record.notes.contains(&ScanNote::PentameterSpondaic));

        let fourteen: Vec<WeightedSyllable> =
            (0..14).map(|_| syl("ta", Ambiguous)).collect();
        let record = scanner.scan("", &fourteen, Meter::Pentameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-UU-UU--UU-UUX");
        assert!(record.notes.contains(&ScanNote::PentameterDactylic));

        let eleven: Vec<WeightedSyllable> =
            (0..11).map(|_| syl("ta", Ambiguous)).collect();
        let record = scanner.scan("", &eleven, Meter::Pentameter);
        assert!(!record.valid);
        assert!(record.notes.contains(&ScanNote::PentameterTooShort));

        let fifteen: Vec<WeightedSyllable> =
            (0..15).map(|_| syl("ta", Ambiguous)).collect();
        let record = scanner.scan("", &fifteen, Meter::Pentameter);
        assert!(!record.valid);
        assert!(record.notes.contains(&ScanNote::PentameterTooLong));
    }

    #[test]
    fn test_pentameter_thirteen_resolved_by_weights() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // A short second syllable pins the dactyl to the first foot.
        let mut syllables: Vec<WeightedSyllable> =
            (0..13).map(|_| syl("ta", Ambiguous)).collect();
        syllables[1] = syl("ta", Short);
        let record = scanner.scan("", &syllables, Meter::Pentameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-UU----UU-UUX");
        assert!(!record.notes.contains(&ScanNote::ClosestMatch));
    }

    #[test]
    fn test_pentameter_thirteen_ambiguous_closest_match() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let syllables: Vec<WeightedSyllable> =
            (0..13).map(|_| syl("ta", Ambiguous)).collect();
        let record = scanner.scan("", &syllables, Meter::Pentameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-UU----UU-UUX");
        assert!(record.notes.contains(&ScanNote::ClosestMatch));
    }

    #[test]
    fn test_hendecasyllable() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);

        let eleven: Vec<WeightedSyllable> =
            (0..11).map(|_| syl("ta", Ambiguous)).collect();
        let record = scanner.scan("", &eleven, Meter::Hendecasyllable);
        assert!(record.valid);
        assert_eq!(record.scansion, "---UU-U-U-X");
        assert!(record.notes.is_empty());

        let ten: Vec<WeightedSyllable> = (0..10).map(|_| syl("ta", Ambiguous)).collect();
        let record = scanner.scan("", &ten, Meter::Hendecasyllable);
        assert!(!record.valid);
        assert!(record.notes.contains(&ScanNote::HendecasyllableTooShort));

        let twelve: Vec<WeightedSyllable> =
            (0..12).map(|_| syl("ta", Ambiguous)).collect();
        let record = scanner.scan("", &twelve, Meter::Hendecasyllable);
        assert!(!record.valid);
        assert!(record.notes.contains(&ScanNote::HendecasyllableTooLong));
    }

    #[test]
    fn test_hendecasyllable_iambic_base_kept() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let mut syllables: Vec<WeightedSyllable> =
            (0..11).map(|_| syl("ta", Ambiguous)).collect();
        syllables[0] = syl("ta", Short);
        let record = scanner.scan("", &syllables, Meter::Hendecasyllable);
        assert!(record.valid);
        assert_eq!(record.scansion, "U--UU-U-U-X");
    }

    #[test]
    fn test_empty_input_is_invalid_syllables() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let record = scanner.scan("", &[], Meter::Hexameter);
        assert!(!record.valid);
        assert_eq!(record.notes, vec![ScanNote::InvalidSyllables]);
    }

    #[test]
    fn test_vowelless_syllable_is_invalid_syllables() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let syllables = vec![syl("br", Ambiguous), syl("kr", Ambiguous)];
        let record = scanner.scan("br kr", &syllables, Meter::Hexameter);
        assert!(!record.valid);
        assert_eq!(record.notes, vec![ScanNote::InvalidSyllables]);
    }

    #[test]
    fn test_positional_long_by_cluster() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let (resolved, fired) = scanner.resolve_positionally(&[
            syl("rum", Ambiguous),
            syl_f("que", Ambiguous),
        ]);
        assert!(fired);
        assert_eq!(resolved[0].weight, Weight::Long);
    }

    #[test]
    fn test_positional_mute_liquid_stays_ambiguous() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let (resolved, _) = scanner.resolve_positionally(&[
            syl_f("no", Ambiguous),
            syl("tro", Ambiguous),
        ]);
        assert_eq!(resolved[0].weight, Weight::Ambiguous);
    }

    #[test]
    fn test_positional_hiatus_shortens() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // "pi-us": vowel before vowel inside a word scans short.
        let (resolved, fired) = scanner.resolve_positionally(&[
            syl("pi", Ambiguous),
            syl_f("us", Ambiguous),
        ]);
        assert!(fired);
        assert_eq!(resolved[0].weight, Weight::Short);
    }

    #[test]
    fn test_positional_prefix_blocks_hiatus_shortening() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        // "de-est" (deest): "de" is a compound prefix, so the boundary
        // blocks the vowel-before-vowel shortening.
        let (resolved, _) = scanner.resolve_positionally(&[
            syl("de", Ambiguous),
            syl_f("est", Ambiguous),
        ]);
        assert_eq!(resolved[0].weight, Weight::Ambiguous);
    }

    #[test]
    fn test_positional_double_consonant_lengthens() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let (resolved, fired) = scanner.resolve_positionally(&[
            syl("sa", Ambiguous),
            syl_f("xum", Ambiguous),
        ]);
        assert!(fired);
        assert_eq!(resolved[0].weight, Weight::Long);
    }

    #[test]
    fn test_nucleus_index() {
        assert_eq!(nucleus_index("ar"), Some(0));
        assert_eq!(nucleus_index("rum"), Some(1));
        assert_eq!(nucleus_index("quī"), Some(2));
        assert_eq!(nucleus_index("ae"), Some(1));
        assert_eq!(nucleus_index("tro"), Some(2));
        // Glide i before a vowel is skipped; the nucleus is the diphthong.
        assert_eq!(nucleus_index("iae"), Some(2));
        assert_eq!(nucleus_index("iam"), Some(1));
        assert_eq!(nucleus_index("br"), None);
    }

    #[test]
    fn test_accented_falls_back_on_text_mismatch() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let (_, syllables) = aeneid_1_1();
        // Original text that the syllables cannot spell out: the scan
        // still succeeds, the accented rendering falls back verbatim.
        let record = scanner.scan("lorem ipsum", &syllables, Meter::Hexameter);
        assert!(record.valid);
        assert_eq!(record.scansion, "-UU-UU-----UU-X");
        assert_eq!(record.accented, "lorem ipsum");
    }

    #[test]
    fn test_scan_is_pure() {
        let profile = ScansionProfile::default();
        let scanner = MeterScanner::new(&profile);
        let (line, syllables) = aeneid_1_1();
        let first = scanner.scan(line, &syllables, Meter::Hexameter);
        let second = scanner.scan(line, &syllables, Meter::Hexameter);
        assert_eq!(first, second);
    }
}
