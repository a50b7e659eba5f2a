//! HTTP and WebSocket front end
//!
//! Routes:
//!
//! | Method | Path         | Auth  | Purpose                              |
//! |--------|--------------|-------|--------------------------------------|
//! | POST   | `/webhook`   | Basic | ingest one telemetry event           |
//! | GET    | `/ws`        | none  | subscribe to the live stream         |
//! | POST   | `/api/reset` | Basic | clear history and notify subscribers |
//! | GET    | `/api/stats` | Basic | hub statistics                       |

pub mod auth;
pub mod config;
pub mod listener;
pub mod routes;

pub use auth::Credentials;
pub use config::ServerConfig;
pub use listener::RelayServer;
pub use routes::{router, AppState};
