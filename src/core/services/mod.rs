pub mod import_service;
pub mod suggestion_service;
pub mod summary_service;
pub mod transaction_service;

pub use import_service::ImportService;
pub use suggestion_service::SuggestionService;
pub use summary_service::SummaryService;
pub use transaction_service::{TransactionDraft, TransactionService};
