//! Intent Classifier — detects "change the hook / framework / CTA" requests.
//!
//! Pure regex matching, case-insensitive. Categories are checked
//! independently, so "change the hook and CTA" flags both.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::generation::phrase_bank::PhraseCategory;

const HOOK_WORDS: &str = r"hooks?|opening\s+lines?";
const FRAMEWORK_WORDS: &str = r"frameworks?";
const CTA_WORDS: &str = r"ctas?|calls?[\s-]+to[\s-]+actions?";

const CHANGE_VERBS: &str = r"change|switch|replace|swap|update|modify|alter|rework|redo|tweak";
const DETERMINERS: &str = r"the|a|an|my|this|that|your|its";
const VARIANT_ADJECTIVES: &str = r"different|another|new|fresh|other|alternative";
const ASK_VERBS: &str = r"use|try|give\s+me";

/// Which categories the request asks to vary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeIntent {
    pub hook: bool,
    pub framework: bool,
    pub cta: bool,
}

impl ChangeIntent {
    pub fn any(&self) -> bool {
        self.hook || self.framework || self.cta
    }

    pub fn requested(&self, category: PhraseCategory) -> bool {
        match category {
            PhraseCategory::Hook => self.hook,
            PhraseCategory::Framework => self.framework,
            PhraseCategory::Cta => self.cta,
        }
    }
}

/// Paraphrase patterns for one category. A coordinated list of other
/// category nouns may precede the target ("swap the hook and the CTA").
fn category_patterns(category_words: &str) -> Vec<Regex> {
    let any_category = format!("{HOOK_WORDS}|{FRAMEWORK_WORDS}|{CTA_WORDS}");
    let list_prefix =
        format!(r"(?:(?:{any_category})\s*(?:,|\band\b|&|/)\s*(?:(?:{DETERMINERS})\s+)?)*");
    let templates = [
        // "change the hook", "swap up my CTA", "change the hook and CTA"
        format!(
            r"(?i)\b(?:{CHANGE_VERBS})\s+(?:up\s+)?(?:(?:{DETERMINERS})\s+)?{list_prefix}(?:{category_words})\b"
        ),
        // "use a different hook", "try another framework", "give me a new CTA"
        format!(
            r"(?i)\b(?:{ASK_VERBS})\s+(?:(?:a|an|the|some)\s+)?(?:{VARIANT_ADJECTIVES})\s+{list_prefix}(?:{category_words})\b"
        ),
        // "different hook please", "new CTA"
        format!(r"(?i)^\s*(?:(?:a|an)\s+)?(?:{VARIANT_ADJECTIVES})\s+{list_prefix}(?:{category_words})\b"),
        // "the hook needs to change", only at the start of the request
        format!(
            r"(?i)^\s*(?:(?:{DETERMINERS})\s+)?(?:{category_words})\s+(?:needs?\s+to|should|must|could)\s+(?:be\s+)?(?:changed?|different|replaced|swapped|updated)\b"
        ),
    ];
    templates
        .iter()
        .map(|t| Regex::new(t).expect("Invalid regex: change-intent template"))
        .collect()
}

// Compile patterns once at startup
static HOOK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| category_patterns(HOOK_WORDS));
static FRAMEWORK_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| category_patterns(FRAMEWORK_WORDS));
static CTA_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| category_patterns(CTA_WORDS));

/// Same paraphrases with the target widened to every category, used to
/// cut whole control phrases out of the request text.
static ANY_CATEGORY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    category_patterns(&format!("{HOOK_WORDS}|{FRAMEWORK_WORDS}|{CTA_WORDS}"))
});

/// Classifies the raw request text. Empty text yields all-false.
pub fn classify(text: &str) -> ChangeIntent {
    if text.trim().is_empty() {
        return ChangeIntent::default();
    }
    let matches = |patterns: &[Regex]| patterns.iter().any(|re| re.is_match(text));
    ChangeIntent {
        hook: matches(&HOOK_PATTERNS),
        framework: matches(&FRAMEWORK_PATTERNS),
        cta: matches(&CTA_PATTERNS),
    }
}

/// Removes every recognized change phrase. Returns the remaining text and
/// whether anything was removed.
pub fn strip_change_phrases(text: &str) -> (String, bool) {
    let mut remaining = text.to_string();
    let mut removed = false;
    for re in ANY_CATEGORY_PATTERNS.iter() {
        if re.is_match(&remaining) {
            remaining = re.replace_all(&remaining, " ").into_owned();
            removed = true;
        }
    }
    (remaining, removed)
}
