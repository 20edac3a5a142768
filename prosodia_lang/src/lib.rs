// Static linguistic layer for Latin metrical scansion.
//
// Provides the symbol profile, weight/meter/note types, and fixed phonology
// tables consumed by `prosodia_meter` (the scanner, formatter, and clausulae
// analyzer). No algorithms live here beyond trivial derivations.
//
// Architecture:
// - `types.rs`: Core types — `Weight`, `Meter`, `WeightedSyllable`,
//   `ScanNote`, `VerseRecord`, `Clausula`
// - `tables.rs`: Const phonology tables (vowels, diphthongs, consonant
//   classes, compound prefixes) with lookup helpers
// - `lib.rs` (this file): `ScansionProfile` — the configurable symbol set
//   and its derived foot constants
//
// A profile can be loaded from a JSON string via
// `ScansionProfile::from_json()` (JSON string in, typed struct out), with
// `Default` providing the conventional `U` / `-` / `X` / `|` symbols.
//
// Determinism constraint: everything here is pure data. No RNG, no I/O, no
// HashMap iteration order anywhere.

pub mod tables;
pub mod types;

// Re-export key types at crate root for convenience.
pub use types::{Clausula, Meter, ScanNote, VerseRecord, Weight, WeightedSyllable};

use serde::{Deserialize, Serialize};

/// The symbol set scansion strings are written in, plus derived foot
/// constants.
///
/// The four symbols are configuration, not constants: callers may scan with
/// `˘`/`¯` instead of `U`/`-`. Every foot constant is derived from the
/// symbols so a custom profile stays internally consistent. The foot
/// separator is display-only and never part of the weight alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScansionProfile {
    /// Symbol for a short (unstressed) syllable.
    #[serde(default = "default_unstressed")]
    pub unstressed: char,
    /// Symbol for a long (stressed) syllable.
    #[serde(default = "default_stressed")]
    pub stressed: char,
    /// Symbol for the metrically free line-final syllable.
    #[serde(default = "default_optional_ending")]
    pub optional_ending: char,
    /// Symbol inserted between feet for display only.
    #[serde(default = "default_foot_separator")]
    pub foot_separator: char,
}

fn default_unstressed() -> char {
    'U'
}

fn default_stressed() -> char {
    '-'
}

fn default_optional_ending() -> char {
    'X'
}

fn default_foot_separator() -> char {
    '|'
}

impl Default for ScansionProfile {
    fn default() -> Self {
        ScansionProfile {
            unstressed: default_unstressed(),
            stressed: default_stressed(),
            optional_ending: default_optional_ending(),
            foot_separator: default_foot_separator(),
        }
    }
}

impl ScansionProfile {
    /// Parse a profile from a JSON string. Missing fields fall back to the
    /// conventional symbols.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    // Derived foot constants. Order of symbols encodes the foot shape.

    pub fn iamb(&self) -> String {
        [self.unstressed, self.stressed].iter().collect()
    }

    pub fn trochee(&self) -> String {
        [self.stressed, self.unstressed].iter().collect()
    }

    pub fn spondee(&self) -> String {
        [self.stressed, self.stressed].iter().collect()
    }

    pub fn anapest(&self) -> String {
        [self.unstressed, self.unstressed, self.stressed].iter().collect()
    }

    pub fn dactyl(&self) -> String {
        [self.stressed, self.unstressed, self.unstressed].iter().collect()
    }

    pub fn amphibrach(&self) -> String {
        [self.unstressed, self.stressed, self.unstressed].iter().collect()
    }

    pub fn pyrrhic(&self) -> String {
        [self.unstressed, self.unstressed].iter().collect()
    }

    /// The canonical hexameter-ending foot: a long syllable followed by
    /// the metrically free final.
    pub fn hexameter_ending(&self) -> String {
        [self.stressed, self.optional_ending].iter().collect()
    }

    /// The explicit rejection pattern: no hexameter foot may open with two
    /// unstressed syllables. Shape coincides with the pyrrhic but the
    /// meaning differs, so it gets its own constant.
    pub fn invalid_foot(&self) -> String {
        [self.unstressed, self.unstressed].iter().collect()
    }

    /// The note catalog: every correction tag paired with its explanation,
    /// in catalog order.
    pub fn note_catalog(&self) -> Vec<(&'static str, &'static str)> {
        ScanNote::ALL
            .iter()
            .map(|n| (n.tag(), n.explanation()))
            .collect()
    }
}
