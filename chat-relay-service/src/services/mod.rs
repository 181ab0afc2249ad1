pub mod history;
pub mod metrics;
pub mod providers;
pub mod session;

pub use history::{load_history, HistoryError, HistoryLoad};
pub use session::ChatSession;
