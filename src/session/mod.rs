pub mod persist;
pub mod reward;
pub mod store;
pub mod types;

pub use persist::{SessionStorage, STORAGE_KEY};
pub use reward::SessionStats;
pub use store::{sanitize_username, SessionState, SessionStore, TurnContext};
pub use types::*;
