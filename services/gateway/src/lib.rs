//! HTTP surface of the trading engine
//!
//! Order intake publishes to the ingress bus and acknowledges with 202;
//! read endpoints serve snapshots of the book, the statistics map, and the
//! net-worth leaderboard. All errors surface as `{"error": …}` JSON with
//! an appropriate status code.

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use models::OrderRequest;
pub use router::create_router;
pub use state::AppState;
