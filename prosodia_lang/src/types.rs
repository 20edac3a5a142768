// Core scansion types: syllable weights, meters, correction notes, and the
// verse record produced by a scan.
//
// The type hierarchy is:
// - `Weight` — long / short / ambiguous syllable weight
// - `Meter` — the three supported verse meters
// - `WeightedSyllable` — one syllable as delivered by the external
//   syllabifier: orthographic text, pre-assigned weight, word boundary flag
// - `ScanNote` — a closed enum of correction reasons; `Display` renders the
//   short tag, `explanation()` the catalog text
// - `VerseRecord` — the immutable result of scanning one line
// - `Clausula` — a named prose rhythm pattern
//
// All types derive `Serialize`/`Deserialize`; a `VerseRecord` survives a
// serde_json round trip as an equal value, which is the reproducibility
// contract downstream reporting relies on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrical weight of one syllable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weight {
    /// Scans long (stressed).
    Long,
    /// Scans short (unstressed).
    Short,
    /// Vowel length not yet determined by context.
    Ambiguous,
}

/// The verse meters the scanner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meter {
    Hexameter,
    Pentameter,
    Hendecasyllable,
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meter::Hexameter => write!(f, "hexameter"),
            Meter::Pentameter => write!(f, "pentameter"),
            Meter::Hendecasyllable => write!(f, "hendecasyllable"),
        }
    }
}

/// One syllable of a line, as delivered by the external syllabifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeightedSyllable {
    /// Orthographic text of the syllable (may carry macrons).
    pub text: String,
    /// Pre-assigned weight; `Ambiguous` when length is undetermined.
    pub weight: Weight,
    /// True when this syllable ends a word. The elision rule needs word
    /// boundaries, and the syllabifier is the only party that knows them.
    #[serde(default)]
    pub word_final: bool,
}

impl WeightedSyllable {
    pub fn new(text: &str, weight: Weight) -> Self {
        WeightedSyllable {
            text: text.to_string(),
            weight,
            word_final: false,
        }
    }

    /// Same as `new` but marking a word boundary after this syllable.
    pub fn word_final(text: &str, weight: Weight) -> Self {
        WeightedSyllable {
            text: text.to_string(),
            weight,
            word_final: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Correction notes
// ---------------------------------------------------------------------------

/// A correction reason recorded during a scan.
///
/// This is the closed set of heuristics the scanner may apply. `Display`
/// renders the short tag (`"< 12"`, `"5th dactyl"`, ...) that appears in
/// `VerseRecord.notes`; `explanation()` gives the human-readable catalog
/// text for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanNote {
    /// Weights resolved by purely positional rules (clusters, hiatus,
    /// elision).
    Positionally,
    /// An inverted amphibrach (long-short-long) was coerced.
    Inverted,
    /// The opening foot began unstressed and was coerced to a spondee.
    InvalidStart,
    /// A later foot began unstressed and was coerced to a spondee.
    InvalidFoot,
    /// A 13-syllable line was forced to the fifth-foot-dactyl pattern.
    FifthDactyl,
    /// Intervocalic `i` treated as a consonantal glide and re-scanned.
    IToJ,
    /// 17 syllables: assumed an all-dactyl line.
    SeventeenSyllables,
    /// 12 syllables: assumed an all-spondee line.
    TwelveSyllables,
    /// Fewer than 12 syllables; not scannable as hexameter.
    HexameterTooShort,
    /// More than 17 syllables; not scannable as hexameter.
    HexameterTooLong,
    /// Ambiguous feet filled forward from a resolved opening dactyl.
    DactylSmoothing,
    /// Ambiguous feet filled backward from the resolved antepenult foot.
    AntepenultChain,
    /// Ambiguous feet filled backward from a resolved dactylic fifth foot.
    PenultimateDactylChain,
    /// No exact rule applied; nearest valid pattern selected by edit
    /// distance.
    ClosestMatch,
    /// No repair succeeded; the line is reported unscannable.
    InvalidSyllables,
    /// 12-syllable pentameter: assumed spondaic first hemiepes.
    PentameterSpondaic,
    /// 14-syllable pentameter: assumed dactylic first hemiepes.
    PentameterDactylic,
    /// Fewer than 12 syllables; not scannable as pentameter.
    PentameterTooShort,
    /// More than 14 syllables; not scannable as pentameter.
    PentameterTooLong,
    /// Fewer than 11 syllables; not scannable as hendecasyllable.
    HendecasyllableTooShort,
    /// More than 11 syllables; not scannable as hendecasyllable.
    HendecasyllableTooLong,
}

impl ScanNote {
    /// Every variant, in catalog order. Kept exhaustive by the
    /// `note_catalog` test.
    pub const ALL: &'static [ScanNote] = &[
        ScanNote::Positionally,
        ScanNote::Inverted,
        ScanNote::InvalidStart,
        ScanNote::InvalidFoot,
        ScanNote::FifthDactyl,
        ScanNote::IToJ,
        ScanNote::SeventeenSyllables,
        ScanNote::TwelveSyllables,
        ScanNote::HexameterTooShort,
        ScanNote::HexameterTooLong,
        ScanNote::DactylSmoothing,
        ScanNote::AntepenultChain,
        ScanNote::PenultimateDactylChain,
        ScanNote::ClosestMatch,
        ScanNote::InvalidSyllables,
        ScanNote::PentameterSpondaic,
        ScanNote::PentameterDactylic,
        ScanNote::PentameterTooShort,
        ScanNote::PentameterTooLong,
        ScanNote::HendecasyllableTooShort,
        ScanNote::HendecasyllableTooLong,
    ];

    /// The short tag recorded in `VerseRecord.notes`.
    pub fn tag(self) -> &'static str {
        match self {
            ScanNote::Positionally => "positionally",
            ScanNote::Inverted => "inverted",
            ScanNote::InvalidStart => "invalid start",
            ScanNote::InvalidFoot => "invalid foot",
            ScanNote::FifthDactyl => "5th dactyl",
            ScanNote::IToJ => "optional i to j",
            ScanNote::SeventeenSyllables => "17",
            ScanNote::TwelveSyllables => "12",
            ScanNote::HexameterTooShort => "< 12",
            ScanNote::HexameterTooLong => "> 17",
            ScanNote::DactylSmoothing => "dactyl smoothing",
            ScanNote::AntepenultChain => "antepenult chain",
            ScanNote::PenultimateDactylChain => "penultimate dactyl chain",
            ScanNote::ClosestMatch => "closest match",
            ScanNote::InvalidSyllables => "invalid syllables",
            ScanNote::PentameterSpondaic => "12p",
            ScanNote::PentameterDactylic => "14p",
            ScanNote::PentameterTooShort => "< 12p",
            ScanNote::PentameterTooLong => "> 14",
            ScanNote::HendecasyllableTooShort => "< 11",
            ScanNote::HendecasyllableTooLong => "> 11",
        }
    }

    /// The human-readable catalog explanation for this note.
    pub fn explanation(self) -> &'static str {
        match self {
            ScanNote::Positionally => {
                "some ambiguous syllable weights were resolved by position: consonant \
                 clusters, hiatus, or elision"
            }
            ScanNote::Inverted => {
                "an inverted amphibrach (long-short-long) is invalid in this meter; the \
                 short syllable was coerced to long"
            }
            ScanNote::InvalidStart => {
                "the opening foot began with an unstressed syllable and was converted to \
                 a spondee"
            }
            ScanNote::InvalidFoot => {
                "a foot began with an unstressed syllable and was converted to a spondee"
            }
            ScanNote::FifthDactyl => {
                "a 13-syllable line admits exactly one dactyl, which must be the fifth \
                 foot; the pattern was forced accordingly"
            }
            ScanNote::IToJ => {
                "intervocalic i was treated as the consonantal glide j and the line \
                 re-scanned with one fewer syllable"
            }
            ScanNote::SeventeenSyllables => "17 syllables: assumed an all-dactyl line",
            ScanNote::TwelveSyllables => "12 syllables: assumed an all-spondee line",
            ScanNote::HexameterTooShort => {
                "fewer than 12 syllables cannot form a hexameter"
            }
            ScanNote::HexameterTooLong => {
                "more than 17 syllables cannot form a hexameter"
            }
            ScanNote::DactylSmoothing => {
                "a run of ambiguous feet was filled forward from the nearest resolved \
                 dactyl"
            }
            ScanNote::AntepenultChain => {
                "a run of ambiguous feet was filled backward from the resolved \
                 antepenultimate foot"
            }
            ScanNote::PenultimateDactylChain => {
                "a run of ambiguous feet was filled backward from the resolved dactylic \
                 fifth foot"
            }
            ScanNote::ClosestMatch => {
                "no exact rule applied; the valid pattern at minimum edit distance was \
                 selected, preferring denser (more dactylic) lines"
            }
            ScanNote::InvalidSyllables => {
                "the syllables are inconsistent with the target meter and no repair \
                 succeeded"
            }
            ScanNote::PentameterSpondaic => {
                "12 syllables: assumed a spondaic first hemiepes"
            }
            ScanNote::PentameterDactylic => {
                "14 syllables: assumed a dactylic first hemiepes"
            }
            ScanNote::PentameterTooShort => {
                "fewer than 12 syllables cannot form a pentameter"
            }
            ScanNote::PentameterTooLong => {
                "more than 14 syllables cannot form a pentameter"
            }
            ScanNote::HendecasyllableTooShort => {
                "fewer than 11 syllables cannot form a hendecasyllable"
            }
            ScanNote::HendecasyllableTooLong => {
                "more than 11 syllables cannot form a hendecasyllable"
            }
        }
    }
}

impl fmt::Display for ScanNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Verse record
// ---------------------------------------------------------------------------

/// The result of scanning one line of verse.
///
/// Immutable after construction. When `valid` is true the number of weight
/// marks in `scansion` equals `syllable_count` equals `syllables.len()`;
/// when `valid` is false those may disagree and `notes` explains why.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseRecord {
    /// The original line exactly as given.
    pub original: String,
    /// The weight string over the profile's alphabet, no foot separators.
    /// Empty when `valid` is false: failure never forces a pattern.
    pub scansion: String,
    /// The meter the line was scanned against.
    pub meter: Option<Meter>,
    /// Whether a canonical foot-consistent pattern was found.
    pub valid: bool,
    /// Number of syllables after positional resolution (elision and glide
    /// merges included).
    pub syllable_count: usize,
    /// The original line with scanned long vowels macronized.
    pub accented: String,
    /// Every heuristic that fired, in order. May contain duplicates.
    pub notes: Vec<ScanNote>,
    /// The syllable segmentation the scansion refers to.
    pub syllables: Vec<String>,
}

impl fmt::Display for VerseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "{} [{}]", self.original, self.scansion)
        } else {
            let notes: Vec<&str> = self.notes.iter().map(|n| n.tag()).collect();
            write!(f, "{} [unscanned: {}]", self.original, notes.join(", "))
        }
    }
}

// ---------------------------------------------------------------------------
// Clausulae
// ---------------------------------------------------------------------------

/// A named prose rhythm pattern over the weight alphabet plus the anceps
/// final symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clausula {
    /// The rhythm's conventional name, e.g. `cretic_trochee`.
    pub rhythm: String,
    /// The literal pattern searched for, e.g. `-u--x`.
    pub pattern: String,
}

impl Clausula {
    pub fn new(rhythm: &str, pattern: &str) -> Self {
        Clausula {
            rhythm: rhythm.to_string(),
            pattern: pattern.to_string(),
        }
    }
}
