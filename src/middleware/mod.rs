pub mod session;

pub use session::{AdminPage, CurrentAdmin, CurrentUser, PageUser};
