//! Orchestration layer: services, the state store, and the dashboard session.

pub mod sequencer;
pub mod services;
pub mod session;
pub mod store;

pub use sequencer::{RequestSequencer, RequestTicket};
pub use session::DashboardSession;
pub use store::{AppState, AppStore, DataOrigin, StoreAction, StoreEffect, SuggestionUiStatus};
