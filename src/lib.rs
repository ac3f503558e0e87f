//! signed_pager library: authenticated request execution and incremental
//! pagination for rate-limited, signature-protected private APIs
//!
//! Every request runs through one identity's shared state: a concurrency
//! gate capping in-flight calls, a session-wide rate-limit coordinator that
//! pauses all callers while a single prober waits out a 429, and a signer fed
//! by an externally published rule set. On top of the executor, the
//! pagination engine rebuilds complete result sets from offset endpoints of
//! unknown length (speculative concurrent waves) and from cursor endpoints
//! (sequential, with an optional cutoff for incremental resync).
//!
//! # Example
//!
//! ```no_run
//! use signed_pager::{connect, init_logger_with, Config, Identity, WaveRequest};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     base_url: "https://api.example.com".to_string(),
//!     rules_url: Some("https://rules.example.com/current.json".to_string()),
//!     max_concurrency: 8,
//!     ..Default::default()
//! };
//! init_logger_with(config.log_level.into(), config.log_format)?;
//! let identity = Identity::new(12345, "sess=...; auth_id=12345").with_x_bc("...");
//!
//! let manager = connect(config, identity).await?;
//! let outcome = manager.authenticator(None).login().await?;
//! if outcome.authenticated {
//!     let request = WaveRequest::new("/api2/v2/users/{identifier}/posts?limit={limit}&offset={offset}")
//!         .identifier("42")
//!         .multiplier(4);
//!     let result = manager.pagination().paginate_waves(&request).await?;
//!     println!("{} posts, {} failed pages", result.items.len(), result.failures.len());
//! }
//! manager.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod auth;
pub mod concurrency;
pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod pagination;
pub mod proxy;
pub mod rate_limit;
pub mod request;
mod run;
pub mod session;
pub mod signing;
pub mod utils;

// Re-export public API
pub use auth::{AuthOutcome, Authenticator, SecondFactorSource};
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{ApiError, ProcessingStats, RequestError};
pub use initialization::init_logger_with;
pub use pagination::{AggregatedResult, CursorRequest, PaginationEngine, WaveRequest};
pub use proxy::{ProxyEndpoint, ProxyPool};
pub use request::{ApiResponse, RequestExecutor};
pub use run::connect;
pub use session::{Identity, SessionManager};
pub use signing::{DynamicRuleSet, RuleSetSource};
