pub mod error;
pub mod health;
pub mod ppv;
pub mod state;

pub use error::ApiError;
pub use state::{AppState, AppStateInner};
