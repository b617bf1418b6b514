use std::sync::Arc;

use tracing::debug;

use super::provider::Eip1193Provider;

/// Pick one provider among the announced candidates.
///
/// Recognized brands win over generic ones; among equal scores the first
/// announced candidate is kept. Returns `None` when nothing was announced.
pub fn locate_provider(
    candidates: &[Arc<dyn Eip1193Provider>],
) -> Option<Arc<dyn Eip1193Provider>> {
    let mut best: Option<&Arc<dyn Eip1193Provider>> = None;
    for candidate in candidates {
        let better = match best {
            Some(current) => candidate.brand().score() > current.brand().score(),
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    if let Some(chosen) = best {
        debug!(brand = ?chosen.brand(), candidates = candidates.len(), "Wallet provider selected");
    }
    best.cloned()
}
