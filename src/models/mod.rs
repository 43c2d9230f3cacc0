// Entity wrappers over the raw JSON documents.

pub mod page;
pub mod user;

pub use page::{Page, PageBuilder, PageStatus};
pub use user::User;
