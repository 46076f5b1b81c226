pub mod models;
pub mod password;
pub mod sanitize;
pub mod store;
pub mod token;
pub mod validation;

pub use models::*;
pub use password::{HashParams, PasswordError, PasswordHasher};
pub use sanitize::SafeHtml;
pub use store::{ComponentStore, IdentityStore, PageStore};
pub use token::{Claims, TokenError, TokenManager};
