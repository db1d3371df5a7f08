//! Variation Selector — picks one phrase per bank while steering away from
//! the client's previous pick.
//!
//! The exclusion logic is a pure function of (bank, previous, force) and the
//! random source is injected, so selection is reproducible under a seed.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::generation::intent::ChangeIntent;
use crate::generation::memory::ClientState;
use crate::generation::phrase_bank::{PhraseBank, PhraseBanks};

/// Phrases eligible for the next pick.
///
/// The previous phrase is excluded only when the bank has more than one
/// entry. If exclusion leaves nothing, a forced change falls back to the full
/// bank; an unforced one yields no candidates.
pub fn candidates<'a>(bank: &'a PhraseBank, previous: Option<&str>, force_change: bool) -> Vec<&'a str> {
    let all: Vec<&str> = bank.phrases().iter().map(String::as_str).collect();
    let previous = match previous {
        Some(p) if all.len() > 1 => p,
        _ => return all,
    };

    let remaining: Vec<&str> = all.iter().copied().filter(|p| *p != previous).collect();
    if remaining.is_empty() && force_change {
        return all;
    }
    remaining
}

/// Uniform pick among `candidates`. `None` when the bank is empty.
pub fn pick_phrase<R: Rng + ?Sized>(
    bank: &PhraseBank,
    previous: Option<&str>,
    force_change: bool,
    rng: &mut R,
) -> Option<String> {
    candidates(bank, previous, force_change)
        .choose(rng)
        .map(|p| p.to_string())
}

/// Picks from `bank` and stores the pick in `last_used`, so the next call
/// for the same client avoids it.
pub fn select_variation<R: Rng + ?Sized>(
    bank: &PhraseBank,
    last_used: &mut Option<String>,
    force_change: bool,
    rng: &mut R,
) -> Variation {
    let previous = last_used.clone();
    let chosen = pick_phrase(bank, previous.as_deref(), force_change, rng);
    match &chosen {
        Some(phrase) => {
            debug!("Selected {}: {phrase:?}", bank.category());
            *last_used = Some(phrase.clone());
        }
        None => debug!("No {} selected (bank empty or exhausted)", bank.category()),
    }
    Variation { chosen, previous }
}

/// The outcome for one category: the new pick and what it replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variation {
    pub chosen: Option<String>,
    pub previous: Option<String>,
}

impl Variation {
    pub fn chosen(&self) -> Option<&str> {
        self.chosen.as_deref()
    }

    /// The previous phrase, only when it differs from the new pick.
    pub fn distinct_previous(&self) -> Option<&str> {
        match (&self.previous, &self.chosen) {
            (Some(prev), Some(chosen)) if prev == chosen => None,
            (Some(prev), _) => Some(prev.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    pub hook: Variation,
    pub framework: Variation,
    pub cta: Variation,
}

/// Selects a hook, framework and CTA for one generation, updating the
/// state's last-used values. A category flagged in `intent` is forced to
/// change.
pub fn select_all<R: Rng + ?Sized>(
    banks: &PhraseBanks,
    state: &mut ClientState,
    intent: ChangeIntent,
    rng: &mut R,
) -> Selections {
    let forced = |bank: &PhraseBank| intent.requested(bank.category());
    Selections {
        hook: select_variation(&banks.hooks, &mut state.last_hook, forced(&banks.hooks), rng),
        framework: select_variation(
            &banks.frameworks,
            &mut state.last_framework,
            forced(&banks.frameworks),
            rng,
        ),
        cta: select_variation(&banks.ctas, &mut state.last_cta, forced(&banks.ctas), rng),
    }
}
