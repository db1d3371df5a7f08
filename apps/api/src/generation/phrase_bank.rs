//! Phrase Bank Loader — candidate hooks, narrative frameworks and CTAs.
//!
//! Sources are flat text files with one phrase per line. A missing or empty
//! source never fails startup: hooks fall back to `DEFAULT_HOOKS`, the other
//! categories are disabled (empty bank, nothing selected, no prompt block).

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

/// Used when the hooks source is missing or yields no usable lines.
pub const DEFAULT_HOOKS: &[&str] = &[
    "Here's what nobody tells you about {topic}:",
    "I used to think {topic} was simple. I was wrong.",
    "3 lessons I learned the hard way about {topic}.",
    "Stop scrolling if {topic} matters to you.",
    "The biggest mistake I see with {topic}?",
];

const QUOTE_CHARS: &[char] = &['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhraseCategory {
    Hook,
    Framework,
    Cta,
}

impl PhraseCategory {
    pub fn label(&self) -> &'static str {
        match self {
            PhraseCategory::Hook => "hook",
            PhraseCategory::Framework => "framework",
            PhraseCategory::Cta => "CTA",
        }
    }
}

impl fmt::Display for PhraseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered, immutable set of cleaned phrases for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseBank {
    category: PhraseCategory,
    phrases: Vec<String>,
}

impl PhraseBank {
    /// Builds a bank from raw entries: trims, strips surrounding quotes,
    /// drops blanks and exact duplicates (first occurrence wins).
    pub fn new<I, S>(category: PhraseCategory, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut phrases: Vec<String> = Vec::new();
        for entry in entries {
            let Some(phrase) = clean_phrase(entry.as_ref()) else {
                continue;
            };
            if !phrases.contains(&phrase) {
                phrases.push(phrase);
            }
        }
        Self { category, phrases }
    }

    pub fn empty(category: PhraseCategory) -> Self {
        Self {
            category,
            phrases: Vec::new(),
        }
    }

    /// Loads a bank from a text source, applying the category's fallback
    /// when the source is unreadable or has no usable lines.
    pub fn load(category: PhraseCategory, path: &Path) -> Self {
        let bank = match std::fs::read_to_string(path) {
            Ok(contents) => Self::new(category, contents.lines()),
            Err(e) => {
                warn!(
                    "Phrase source for {category} unavailable at {}: {e}",
                    path.display()
                );
                Self::empty(category)
            }
        };

        if !bank.is_empty() {
            info!("Loaded {} {category} phrases from {}", bank.len(), path.display());
            return bank;
        }

        match category {
            PhraseCategory::Hook => {
                warn!("No usable hooks at {}; using built-in defaults", path.display());
                Self::new(category, DEFAULT_HOOKS.iter())
            }
            _ => {
                warn!("No usable {category} phrases at {}; category disabled", path.display());
                bank
            }
        }
    }

    pub fn category(&self) -> PhraseCategory {
        self.category
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

/// The three banks the orchestrator selects from.
#[derive(Debug, Clone)]
pub struct PhraseBanks {
    pub hooks: PhraseBank,
    pub frameworks: PhraseBank,
    pub ctas: PhraseBank,
}

impl PhraseBanks {
    pub fn load(hooks_path: &Path, frameworks_path: &Path, ctas_path: &Path) -> Self {
        Self {
            hooks: PhraseBank::load(PhraseCategory::Hook, hooks_path),
            frameworks: PhraseBank::load(PhraseCategory::Framework, frameworks_path),
            ctas: PhraseBank::load(PhraseCategory::Cta, ctas_path),
        }
    }
}

fn clean_phrase(raw: &str) -> Option<String> {
    let phrase = raw.trim().trim_matches(QUOTE_CHARS).trim();
    (!phrase.is_empty()).then(|| phrase.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_new_strips_quotes_blanks_and_duplicates() {
        let bank = PhraseBank::new(
            PhraseCategory::Cta,
            ["  \"What do you think?\"  ", "", "   ", "'Follow for more'", "What do you think?"],
        );
        assert_eq!(bank.phrases(), ["What do you think?", "Follow for more"]);
    }

    #[test]
    fn test_load_reads_one_phrase_per_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Problem, Agitate, Solve").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "\"Before, After, Bridge\"").unwrap();

        let bank = PhraseBank::load(PhraseCategory::Framework, file.path());
        assert_eq!(bank.phrases(), ["Problem, Agitate, Solve", "Before, After, Bridge"]);
    }

    #[test]
    fn test_missing_hooks_source_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let bank = PhraseBank::load(PhraseCategory::Hook, &dir.path().join("nope.txt"));
        assert_eq!(bank.len(), DEFAULT_HOOKS.len());
    }

    #[test]
    fn test_empty_hooks_source_uses_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let bank = PhraseBank::load(PhraseCategory::Hook, file.path());
        assert_eq!(bank.len(), DEFAULT_HOOKS.len());
    }

    #[test]
    fn test_missing_cta_source_disables_category() {
        let dir = tempfile::tempdir().unwrap();
        let bank = PhraseBank::load(PhraseCategory::Cta, &dir.path().join("ctas.txt"));
        assert!(bank.is_empty());
        assert_eq!(bank.category(), PhraseCategory::Cta);
    }
}
