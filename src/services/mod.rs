//! Business logic services. Each service owns a pool clone and is built
//! per request by its handlers.

pub mod activity;
pub mod auth;
pub mod items;
pub mod ledger;
pub mod reports;
pub mod session;
pub mod suppliers;

pub use activity::ActivityService;
pub use auth::AuthService;
pub use items::ItemService;
pub use ledger::LedgerService;
pub use reports::ReportsService;
pub use session::{SessionManager, SessionUser};
pub use suppliers::SupplierService;
