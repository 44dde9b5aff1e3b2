//! Identifiers each WLS language version reserves for the runtime
//!
//! The table is keyed by version tag. Supporting a new version means adding
//! an entry to [`RESERVED_WORDS`]; existing entries are never edited.
//!
//! [`RESERVED_WORDS`]: constant.RESERVED_WORDS.html

/// The version the migration engine targets by default
pub const TARGET_VERSION: &str = "2.0";

/// Prefix applied to a reserved word when it is renamed out of the way
pub const MIGRATED_PREFIX: &str = "_migrated_";

/// Reserved words per language version
pub const RESERVED_WORDS: &[(&str, &[&str])] = &[(
    "2.0",
    &[
        "thread", "await", "spawn", "sync", "channel", "yield", "async", "timer", "effect",
        "parallel",
    ],
)];

/// Gets the reserved words for the given version tag, if the version is known
pub fn reserved_words(version: &str) -> Option<&'static [&'static str]> {
    RESERVED_WORDS
        .iter()
        .find(|(tag, _)| *tag == version)
        .map(|(_, words)| *words)
}

/// Returns true if `name` is reserved in `version`. Comparison ignores case
pub fn is_reserved(version: &str, name: &str) -> bool {
    reserved_words(version)
        .map(|words| words.iter().any(|w| w.eq_ignore_ascii_case(name)))
        .unwrap_or(false)
}

/// All version tags with a reserved-word table
pub fn supported_versions() -> impl Iterator<Item = &'static str> {
    RESERVED_WORDS.iter().map(|(tag, _)| *tag)
}

/// The collision-free name a reserved word is rewritten to
pub fn migrated_name(word: &str) -> String {
    format!("{}{}", MIGRATED_PREFIX, word.to_lowercase())
}
