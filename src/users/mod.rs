pub mod model;
pub mod store;

pub use model::{Role, User};
pub use store::{MemoryUserStore, NewUser, PgUserStore, UserStore};
