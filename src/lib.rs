//! Racerd bridge
//!
//! Editor completion adapter for the racerd code-analysis daemon.
//! Launches racerd as a supervised subprocess, forwards completion and
//! definition requests to it over HTTP+JSON, and maps its responses
//! into the host completion protocol.
//!
//! # Architecture
//!
//! - **Server Module**: process supervisor with stdout port discovery
//! - **Transport Module**: blocking HTTP client (200/204 semantics)
//! - **Request/Response Modules**: pure request and response mapping
//! - **Completer Module**: host-facing surface and command dispatch
//!
//! # Usage
//!
//! ```no_run
//! use racerd_bridge::{RacerdCompleter, UserOptions};
//!
//! let completer = RacerdCompleter::new(&UserOptions::default())
//!     .expect("racerd and rust sources must be resolvable");
//! assert_eq!(completer.supported_filetypes(), &["rust"]);
//! ```

// Clippy configuration - allow common patterns
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod completer;
pub mod config;
pub mod error;
pub mod logging;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;

// Re-export main types
pub use completer::{CommandOutcome, RacerdCompleter, SUPPORTED_FILETYPES};
pub use config::UserOptions;
pub use error::{Error, Result};
pub use request::{Buffer, CompletionRequest, FileData, RacerdRequest};
pub use response::{Candidate, GoToLocation, Location};
pub use server::{PortPolicy, RacerdServer, ServerState};
pub use transport::HttpClient;
