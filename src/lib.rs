#![doc(test(attr(deny(warnings))))]

//! `rl_budget_core` holds the ledger, summary, and suggestion primitives behind the
//! RL budget dashboard, plus the session that keeps them in sync with the
//! budget service.

pub mod client;
pub mod config;
pub mod core;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("rl_budget_core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
