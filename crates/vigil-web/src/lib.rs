pub mod routes;
pub mod server;
pub mod state;

mod error;
mod ws;

pub use error::{Result, WebError};
pub use server::start_server;
pub use state::AppState;
