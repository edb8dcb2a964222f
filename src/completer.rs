//! Host-facing completer surface and command dispatch.
//!
//! `RacerdCompleter` is the contract the host drives: candidate
//! computation, a fixed table of user subcommands, lazy server startup,
//! and shutdown. The supervisor lives behind a single mutex so
//! lifecycle operations and in-flight requests are mutually exclusive.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::{self, UserOptions};
use crate::error::{Error, Result};
use crate::request::{self, CompletionRequest};
use crate::response::{self, Candidate, GoToLocation};
use crate::server::{PortPolicy, RacerdServer};
use crate::transport::HttpClient;

/// Filetypes this completer serves.
pub const SUPPORTED_FILETYPES: &[&str] = &["rust"];

/// Valid user subcommands, in help order.
const SUBCOMMANDS: &[&str] = &[
    "GoTo",
    "GoToDeclaration",
    "GoToDefinition",
    "RestartServer",
    "StopServer",
];

/// Outcome of a dispatched user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Command completed with no payload (StopServer, RestartServer).
    Done,

    /// Go-to-definition resolved to a source location.
    Location(GoToLocation),
}

/// Completer backed by a supervised racerd process.
#[derive(Debug)]
pub struct RacerdCompleter {
    /// The supervised process; the mutex also guards the address and
    /// lifecycle state it owns.
    server: Mutex<RacerdServer>,

    /// Blocking HTTP client.
    http: HttpClient,
}

impl RacerdCompleter {
    /// Creates a completer, resolving the racerd binary and rust source
    /// tree from the user options.
    ///
    /// Fails with [`Error::Config`] when either cannot be resolved;
    /// this is fatal and prevents the completer from loading.
    pub fn new(options: &UserOptions) -> Result<Self> {
        Self::with_port_policy(options, PortPolicy::Dynamic)
    }

    /// Creates a completer with an explicit port policy.
    pub fn with_port_policy(options: &UserOptions, policy: PortPolicy) -> Result<Self> {
        let binary = config::find_racerd_binary(options)
            .ok_or_else(|| Error::Config(config::BINARY_NOT_FOUND_MESSAGE.to_string()))?;
        let rust_src = config::find_rust_src_path(options)
            .ok_or_else(|| Error::Config(config::RUST_SOURCE_NOT_FOUND_MESSAGE.to_string()))?;

        debug!(
            "racerd completer configured: binary={} rust_src={}",
            binary.display(),
            rust_src.display()
        );

        Ok(Self {
            server: Mutex::new(RacerdServer::new(binary, rust_src).with_port_policy(policy)),
            http: HttpClient::new(),
        })
    }

    /// Filetypes this completer serves.
    #[must_use]
    pub fn supported_filetypes(&self) -> &'static [&'static str] {
        SUPPORTED_FILETYPES
    }

    /// The user subcommands this completer understands.
    #[must_use]
    pub fn defined_subcommands(&self) -> Vec<&'static str> {
        SUBCOMMANDS.to_vec()
    }

    /// Computes completion candidates for the request.
    ///
    /// A crashed server is restarted before the request is issued; a
    /// 204 from racerd yields an empty candidate list.
    pub fn compute_candidates(&self, request: &CompletionRequest) -> Result<Vec<Candidate>> {
        debug!("computing candidates for {}", request.filepath);
        let body = request::translate(request);
        let raw = self.get_response("/list_completions", &body)?;
        response::to_candidates(raw)
    }

    /// Dispatches a named user command.
    ///
    /// GoTo, GoToDefinition, and GoToDeclaration all route to the same
    /// go-to-definition operation. An empty argument list or an unknown
    /// name fails with [`Error::Usage`] carrying the help message.
    pub fn on_user_command(
        &self,
        arguments: &[String],
        request: &CompletionRequest,
    ) -> Result<CommandOutcome> {
        let command = arguments.first().ok_or_else(|| Error::Usage {
            help: Self::help_message(),
        })?;

        match command.as_str() {
            "GoTo" | "GoToDefinition" | "GoToDeclaration" => {
                self.go_to_definition(request).map(CommandOutcome::Location)
            }
            "StopServer" => {
                self.stop_server();
                Ok(CommandOutcome::Done)
            }
            "RestartServer" => {
                self.restart_server()?;
                Ok(CommandOutcome::Done)
            }
            _ => Err(Error::Usage {
                help: Self::help_message(),
            }),
        }
    }

    /// Resolves the symbol under the cursor to its defining location.
    ///
    /// Every failure surfaces as [`Error::Navigation`] with the cause
    /// on the source chain.
    pub fn go_to_definition(&self, request: &CompletionRequest) -> Result<GoToLocation> {
        let body = request::translate(request);
        let raw = self
            .get_response("/find_definition", &body)
            .map_err(Error::into_navigation)?;
        // A 204 means racerd found nothing at the cursor; mapping the
        // null reports that as a navigation failure.
        response::to_definition(raw.unwrap_or(Value::Null))
    }

    /// Starts the server if it is not running. Called by the host when
    /// a file becomes ready to parse.
    pub fn on_file_ready_to_parse(&self, _request: &CompletionRequest) -> Result<()> {
        let mut server = self.lock_server();
        if !server.is_running() {
            server.start()?;
        }
        Ok(())
    }

    /// Probes the running server over HTTP.
    ///
    /// Unlike [`Self::server_is_running`], this detects a hung process,
    /// at the cost of a request round-trip. A stopped server is
    /// reported as down, never started as a side effect.
    pub fn ping(&self) -> Result<()> {
        let mut server = self.lock_server();
        if !server.is_running() {
            return Err(Error::Startup("racerd is not running".to_string()));
        }
        let address = server
            .address()
            .ok_or_else(|| Error::Startup("racerd has no listen address".to_string()))?
            .to_string();
        self.http.post(&address, "/ping", &json!({ "ping": true }))?;
        Ok(())
    }

    /// Returns true if the server process exists and has not exited.
    pub fn server_is_running(&self) -> bool {
        self.lock_server().is_running()
    }

    /// Stops the server. No-op when already stopped.
    pub fn stop_server(&self) {
        info!("StopServer requested");
        self.lock_server().stop();
    }

    /// Stops and restarts the server.
    pub fn restart_server(&self) -> Result<()> {
        info!("RestartServer requested");
        self.lock_server().restart()
    }

    /// Stops the server on host shutdown.
    pub fn shutdown(&self) {
        self.lock_server().stop();
    }

    /// Acquires the supervisor lock, recovering from poisoning; the
    /// supervisor's state is valid after a panicked holder because every
    /// mutation leaves it in a coherent lifecycle state.
    fn lock_server(&self) -> MutexGuard<'_, RacerdServer> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ensures the server is running and POSTs to it, holding the
    /// supervisor lock for the whole exchange so a concurrent restart
    /// cannot swap the address mid-request.
    fn get_response<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Option<Value>> {
        let mut server = self.lock_server();
        if !server.is_running() {
            server.start()?;
        }
        let address = server
            .address()
            .ok_or_else(|| Error::Startup("racerd has no listen address".to_string()))?
            .to_string();
        self.http.post(&address, endpoint, body)
    }

    /// Help message enumerating the valid commands.
    fn help_message() -> String {
        format!("Supported commands are:\n  {}", SUBCOMMANDS.join("\n  "))
    }
}

impl Drop for RacerdCompleter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Builds a completer whose binary and source paths resolve, without
    /// starting any process.
    fn test_completer() -> (RacerdCompleter, tempfile::NamedTempFile, tempfile::TempDir) {
        let binary = tempfile::NamedTempFile::new().expect("temp binary");
        let src_dir = tempfile::tempdir().expect("temp src dir");
        let options = UserOptions {
            racerd_binary_path: Some(binary.path().to_path_buf()),
            rust_src_path: Some(src_dir.path().to_path_buf()),
            keep_logfiles: false,
        };
        let completer = RacerdCompleter::new(&options).expect("completer");
        (completer, binary, src_dir)
    }

    #[test]
    fn test_supported_filetypes() {
        let (completer, _binary, _src) = test_completer();
        assert_eq!(completer.supported_filetypes(), &["rust"]);
    }

    #[test]
    fn test_defined_subcommands_are_complete() {
        let (completer, _binary, _src) = test_completer();
        let commands = completer.defined_subcommands();
        for expected in ["GoTo", "GoToDefinition", "GoToDeclaration", "StopServer", "RestartServer"]
        {
            assert!(commands.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn test_empty_arguments_is_usage_error() {
        let (completer, _binary, _src) = test_completer();
        let error = completer
            .on_user_command(&[], &CompletionRequest::default())
            .expect_err("empty arguments");
        match error {
            Error::Usage { help } => {
                assert!(help.contains("GoToDefinition"));
                assert!(help.contains("RestartServer"));
            }
            other => panic!("expected usage error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_command_is_usage_error() {
        let (completer, _binary, _src) = test_completer();
        let error = completer
            .on_user_command(&["FixIt".to_string()], &CompletionRequest::default())
            .expect_err("unknown command");
        assert!(matches!(error, Error::Usage { .. }));
    }

    #[test]
    fn test_stop_server_when_stopped_is_noop() {
        let (completer, _binary, _src) = test_completer();
        completer.stop_server();
        assert!(!completer.server_is_running());

        let outcome = completer
            .on_user_command(&["StopServer".to_string()], &CompletionRequest::default())
            .expect("stop dispatch");
        assert_eq!(outcome, CommandOutcome::Done);
    }

    #[test]
    fn test_ping_does_not_start_a_stopped_server() {
        let (completer, _binary, _src) = test_completer();
        assert!(!completer.server_is_running());

        let error = completer.ping().expect_err("stopped server is down");
        assert!(matches!(error, Error::Startup(_)));

        // The probe must not have booted the server as a side effect.
        assert!(!completer.server_is_running());
    }

    #[test]
    fn test_missing_binary_is_config_error() {
        let src_dir = tempfile::tempdir().expect("temp src dir");
        let options = UserOptions {
            racerd_binary_path: Some(PathBuf::from("/nonexistent/racerd")),
            rust_src_path: Some(src_dir.path().to_path_buf()),
            keep_logfiles: false,
        };
        let error = RacerdCompleter::new(&options).expect_err("missing binary");
        match error {
            Error::Config(message) => assert!(message.contains("racerd binary not found")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_rust_src_is_config_error() {
        let binary = tempfile::NamedTempFile::new().expect("temp binary");
        let options = UserOptions {
            racerd_binary_path: Some(binary.path().to_path_buf()),
            rust_src_path: Some(PathBuf::from("/nonexistent/src")),
            keep_logfiles: false,
        };
        let error = RacerdCompleter::new(&options).expect_err("missing src");
        match error {
            Error::Config(message) => assert_eq!(message, config::RUST_SOURCE_NOT_FOUND_MESSAGE),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
