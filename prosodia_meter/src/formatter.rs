// Scansion display: foot separators and macron merging.
//
// Two independent pure operations over a `ScansionProfile`:
// - `insert_feet` marks foot boundaries in a finished weight string.
//   Hexameter feet are only reliably delimited from the line's end inward
//   (the tail shapes are unambiguous, the head is not), so the walk runs
//   right to left.
// - `merge_with_text` folds a char-aligned stress string back onto the
//   original orthography, macronizing marked vowels. Digraph `qu` and the
//   listed diphthongs are never accented.
//
// Failure model: `merge_with_text` returns an error only for a caller
// contract violation (stress string longer than the text). A stressed mark
// over an unmappable character is a data error in the input: it is logged
// and the character passed through unchanged.

use prosodia_lang::{Meter, ScansionProfile, tables};
use thiserror::Error;

/// Hard failure from `merge_with_text`: the stress string and text are
/// structurally incompatible. Distinct from an unscannable line, which is
/// reported through `VerseRecord.valid`, never through an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("stress string extends {extra} mark(s) past the end of the text")]
    Misaligned { extra: usize },
}

/// Renders finished scansions: foot-delimited stress strings and
/// macronized text.
pub struct ScansionFormatter<'a> {
    profile: &'a ScansionProfile,
}

impl<'a> ScansionFormatter<'a> {
    pub fn new(profile: &'a ScansionProfile) -> Self {
        ScansionFormatter { profile }
    }

    /// Insert foot separators into a stress string for the given meter.
    ///
    /// Any separators already present are stripped first, which makes the
    /// operation idempotent: re-running it on its own output moves nothing.
    pub fn insert_feet(&self, scansion: &str, meter: Meter) -> String {
        let marks: Vec<char> = scansion
            .chars()
            .filter(|&c| c != self.profile.foot_separator)
            .collect();
        let feet = match meter {
            Meter::Hexameter => self.split_hexameter(&marks),
            Meter::Pentameter => self.split_pentameter(&marks),
            Meter::Hendecasyllable => self.split_hendecasyllable(&marks),
        };
        let separator = self.profile.foot_separator.to_string();
        feet.join(&separator)
    }

    /// Hexameter feet, delimited from the tail inward: the ending foot and
    /// the plain spondee are the two literal suffix shapes that are
    /// unambiguous there. Each match consumes 2 marks; anything else is a
    /// dactyl and consumes 3.
    fn split_hexameter(&self, marks: &[char]) -> Vec<String> {
        let spondee: Vec<char> = self.profile.spondee().chars().collect();
        let ending: Vec<char> = self.profile.hexameter_ending().chars().collect();
        let mut feet: Vec<String> = Vec::new();
        let mut end = marks.len();
        while end > 0 {
            let consumed = if end >= 2 && (marks[end - 2..end] == spondee[..] || marks[end - 2..end] == ending[..]) {
                2
            } else if end >= 3 {
                3
            } else {
                end
            };
            feet.push(marks[end - consumed..end].iter().collect());
            end -= consumed;
        }
        feet.reverse();
        feet
    }

    /// Pentameter feet from the tail: free final, two dactyls, the hemiepes
    /// close, then the variable first half delimited like a hexameter head.
    fn split_pentameter(&self, marks: &[char]) -> Vec<String> {
        if marks.len() < 7 {
            return vec![marks.iter().collect()];
        }
        let split = marks.len() - 7;
        let (head, tail) = marks.split_at(split);
        // The head is feet one and two plus the single long hemiepes close,
        // so the right-to-left walk runs on everything before the close.
        let mut feet = match head.split_last() {
            Some((close, feet_marks)) => {
                let mut feet = self.split_hexameter(feet_marks);
                feet.push(close.to_string());
                feet
            }
            None => Vec::new(),
        };
        feet.push(tail[..3].iter().collect());
        feet.push(tail[3..6].iter().collect());
        feet.push(tail[6..].iter().collect());
        feet
    }

    /// Hendecasyllable feet in the fixed Phalaecian split:
    /// base | dactyl | trochee | trochee | close.
    fn split_hendecasyllable(&self, marks: &[char]) -> Vec<String> {
        if marks.len() != 11 {
            return vec![marks.iter().collect()];
        }
        [0..2, 2..5, 5..7, 7..9, 9..11]
            .into_iter()
            .map(|r| marks[r].iter().collect())
            .collect()
    }

    /// Merge a char-aligned stress string onto the original line,
    /// macronizing every vowel under a stressed mark.
    ///
    /// The two strings walk in lock-step; the stress string is right-padded
    /// with blanks, so trailing text passes through unchanged and the
    /// output always has exactly as many chars as the input text. Skip
    /// rules: a vowel straight after the digraph `qu` is never marked, the
    /// second element of a diphthong is never marked, and an
    /// already-macronized vowel is left as it stands.
    pub fn merge_with_text(&self, original: &str, stress: &str) -> Result<String, FormatError> {
        let text: Vec<char> = original.chars().collect();
        let marks: Vec<char> = stress.chars().collect();
        if marks.len() > text.len() {
            return Err(FormatError::Misaligned {
                extra: marks.len() - text.len(),
            });
        }
        let mut merged = String::with_capacity(original.len());
        for (i, &c) in text.iter().enumerate() {
            let mark = marks.get(i).copied().unwrap_or(' ');
            if mark != self.profile.stressed {
                merged.push(c);
                continue;
            }
            let after_qu = i >= 2
                && text[i - 2].to_ascii_lowercase() == 'q'
                && text[i - 1].to_ascii_lowercase() == 'u';
            let in_diphthong = i >= 1 && tables::is_diphthong(text[i - 1], c);
            if after_qu || in_diphthong {
                merged.push(c);
            } else if let Some(accented) = tables::accent(c) {
                merged.push(accented);
            } else {
                if tables::unaccent(c).is_none() {
                    // Not a vowel in either form: the stress string points
                    // at a character that cannot carry a macron.
                    tracing::warn!(
                        position = i,
                        character = %c,
                        "stressed mark over unmappable character"
                    );
                }
                merged.push(c);
            }
        }
        Ok(merged)
    }
}
