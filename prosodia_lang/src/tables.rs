// Static Latin phonology tables: vowels, diphthongs, consonant classes,
// and compound prefixes.
//
// These are the fixed linguistic facts the scanner and formatter consult.
// They are const data with a handful of lookup helpers; nothing here is
// configurable (the configurable symbol set lives in `ScansionProfile`).

/// Plain short-form vowels, positionally aligned with `ACCENTED_VOWELS`.
pub const VOWELS: &str = "aeiouy";

/// Macronized vowels. The character at index `i` is the long form of
/// `VOWELS[i]`; the two tables must stay the same length and in the same
/// order, since `accent`/`unaccent` map between them positionally.
pub const ACCENTED_VOWELS: &str = "āēīōūȳ";

/// Classical diphthongs. A vowel pair on this list scans as one long
/// nucleus and is never split or individually accented.
pub const DIPHTHONGS: &[&str] = &["ae", "au", "ei", "eu", "oe", "ui"];

/// Liquid consonants. A mute followed by a liquid may close a syllable
/// without lengthening the preceding vowel.
pub const LIQUIDS: &str = "lr";

/// Mute (stop) consonants, for the mute + liquid exception.
pub const MUTES: &str = "bcdgpt";

/// Single letters that count as two consonants for position.
pub const DOUBLE_CONSONANTS: &str = "xz";

/// Digraphs that count as one consonant: the aspirates, plus `qu`.
pub const ASPIRATES: &[&str] = &["ch", "ph", "th", "qu"];

/// Compound prefixes, ordered longest/most-specific first. The order is
/// load-bearing: prefix stripping must try `circum` before `con` before
/// `co`, or a longer prefix is shadowed by a shorter one.
pub const PREFIXES: &[&str] = &[
    "circum", "contra", "inter", "intro", "super", "trans", "ante", "post", "prae", "com", "con",
    "dis", "per", "pro", "sub", "ab", "ad", "de", "ex", "in", "ob", "re", "se",
];

/// The long (macronized) form of a plain vowel, preserving case.
/// Returns `None` for anything that is not a plain vowel.
pub fn accent(c: char) -> Option<char> {
    let lower = c.to_ascii_lowercase();
    let idx = VOWELS.chars().position(|v| v == lower)?;
    let accented = ACCENTED_VOWELS.chars().nth(idx)?;
    if c.is_ascii_uppercase() {
        accented.to_uppercase().next()
    } else {
        Some(accented)
    }
}

/// The plain form of a macronized vowel, preserving case.
/// Returns `None` for anything that is not an accented vowel.
pub fn unaccent(c: char) -> Option<char> {
    let (lower, upper) = if c.is_uppercase() {
        (c.to_lowercase().next()?, true)
    } else {
        (c, false)
    };
    let idx = ACCENTED_VOWELS.chars().position(|v| v == lower)?;
    let plain = VOWELS.chars().nth(idx)?;
    if upper { Some(plain.to_ascii_uppercase()) } else { Some(plain) }
}

/// True for a plain vowel in either case.
pub fn is_vowel(c: char) -> bool {
    VOWELS.contains(c.to_ascii_lowercase())
}

/// True for a plain or macronized vowel in either case.
pub fn is_any_vowel(c: char) -> bool {
    is_vowel(c) || unaccent(c).is_some()
}

/// Strip a macron if present, otherwise return the character unchanged.
pub fn fold_accent(c: char) -> char {
    unaccent(c).unwrap_or(c)
}

/// True when the pair `(a, b)` forms a listed diphthong, ignoring case
/// and macrons.
pub fn is_diphthong(a: char, b: char) -> bool {
    let a = fold_accent(a).to_ascii_lowercase();
    let b = fold_accent(b).to_ascii_lowercase();
    DIPHTHONGS
        .iter()
        .any(|d| {
            let mut chars = d.chars();
            chars.next() == Some(a) && chars.next() == Some(b)
        })
}

/// True for a liquid consonant.
pub fn is_liquid(c: char) -> bool {
    LIQUIDS.contains(c.to_ascii_lowercase())
}

/// True for a mute (stop) consonant.
pub fn is_mute(c: char) -> bool {
    MUTES.contains(c.to_ascii_lowercase())
}

/// True for a letter that scans as a double consonant.
pub fn is_double_consonant(c: char) -> bool {
    DOUBLE_CONSONANTS.contains(c.to_ascii_lowercase())
}
