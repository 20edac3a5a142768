// Latin verse scansion and prose rhythm analysis.
//
// Algorithmic layer over `prosodia_lang`'s symbol profile and phonology
// tables:
// - `validator.rs`: per-meter pattern universes and validity checks
// - `scanner.rs`: `MeterScanner` — weighted syllables in, `VerseRecord` out,
//   with the ordered repair-heuristic battery
// - `formatter.rs`: foot separators and macron merging
// - `clausulae.rs`: the clausula catalog and occurrence counting
//
// Every entry point is a pure function of its inputs: same line, same
// profile, same record, on any thread. Nothing here holds interior
// mutability, so the types are `Send + Sync` by construction and callers
// may scan batches in parallel without coordination.
//
// Unscannable input is data, not an error: it comes back as a
// `VerseRecord` with `valid = false` and explanatory notes. The only
// `Result` surface is `merge_with_text`, whose error marks a caller
// contract violation.

pub mod clausulae;
pub mod formatter;
pub mod scanner;
pub mod validator;

// Re-export the main entry points at crate root.
pub use clausulae::{ClausulaCatalog, ClausulaeAnalyzer};
pub use formatter::{FormatError, ScansionFormatter};
pub use scanner::MeterScanner;
pub use validator::MetricalValidator;
