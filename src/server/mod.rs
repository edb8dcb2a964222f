//! Process supervisor for the racerd subprocess.
//!
//! Spawns `racerd serve`, discovers the listen address, and owns the
//! child handle for the lifetime of the completer. Liveness is a
//! handle-based check (`try_wait`); hosts that need to detect a
//! hung-but-alive daemon can use the HTTP ping on the completer instead.
//! Stop policy is a single consistent kill-and-reap.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Minimum token count of the announce line. The bind address is the
/// fourth whitespace-separated token ("racerd listening on host:port").
const ANNOUNCE_MIN_TOKENS: usize = 4;

/// Index of the bind address token on the announce line.
const ANNOUNCE_ADDRESS_INDEX: usize = 3;

/// How the racerd listen port is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortPolicy {
    /// Pass `--port=0` and read the bind address from racerd's first
    /// stdout line.
    #[default]
    Dynamic,

    /// Pass a pre-chosen port and skip stdout discovery.
    Fixed(u16),
}

/// Lifecycle state of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerState {
    /// No child process exists.
    #[default]
    Stopped,

    /// The child was spawned but has not announced an address yet.
    Starting,

    /// The child is serving on a known address.
    Running,
}

/// Supervisor owning the racerd child process.
///
/// At most one instance exists per completer; all lifecycle operations
/// go through the completer's lock, so start, stop, restart, and
/// requests never race on the handle or the address.
#[derive(Debug)]
pub struct RacerdServer {
    /// Path to the racerd executable.
    binary: PathBuf,

    /// Path to the rust standard library sources.
    rust_src_path: PathBuf,

    /// Port selection policy.
    port_policy: PortPolicy,

    /// The child process, when one exists.
    child: Option<Child>,

    /// Discovered or assigned `host:port`.
    address: Option<String>,

    /// Current lifecycle state.
    state: ServerState,
}

impl RacerdServer {
    /// Creates a supervisor for the given binary and source tree.
    #[must_use]
    pub fn new(binary: PathBuf, rust_src_path: PathBuf) -> Self {
        Self {
            binary,
            rust_src_path,
            port_policy: PortPolicy::Dynamic,
            child: None,
            address: None,
            state: ServerState::Stopped,
        }
    }

    /// Sets the port selection policy.
    #[must_use]
    pub fn with_port_policy(mut self, policy: PortPolicy) -> Self {
        self.port_policy = policy;
        self
    }

    /// Starts the racerd process. No-op when it is already running.
    ///
    /// Under [`PortPolicy::Dynamic`] this blocks until racerd announces
    /// its bind address on stdout; a malformed or missing announce line
    /// is a startup failure and the child is reaped.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        self.state = ServerState::Starting;

        let port_arg = match self.port_policy {
            PortPolicy::Dynamic => "--port=0".to_string(),
            PortPolicy::Fixed(port) => format!("--port={port}"),
        };

        info!(
            "starting racerd: {} serve {}",
            self.binary.display(),
            port_arg
        );

        let spawned = Command::new(&self.binary)
            .arg("serve")
            .arg(&port_arg)
            .arg("--secret-file=not_supported")
            .arg(format!("--rust-src-path={}", self.rust_src_path.display()))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.state = ServerState::Stopped;
                return Err(Error::Io(e));
            }
        };

        let address = match self.port_policy {
            PortPolicy::Dynamic => match discover_address(&mut child) {
                Ok(address) => address,
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    self.state = ServerState::Stopped;
                    return Err(e);
                }
            },
            PortPolicy::Fixed(port) => format!("127.0.0.1:{port}"),
        };

        info!("racerd serving HTTP on {}", address);
        self.child = Some(child);
        self.address = Some(address);
        self.state = ServerState::Running;
        Ok(())
    }

    /// Stops the racerd process. No-op when already stopped.
    ///
    /// The child is killed and reaped; racerd holds no state worth a
    /// graceful handshake.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            info!("stopping racerd (pid {})", child.id());
            if let Err(e) = child.kill() {
                warn!("failed to kill racerd: {}", e);
            }
            let _ = child.wait();
        }
        self.address = None;
        self.state = ServerState::Stopped;
    }

    /// Stops and then starts the process.
    pub fn restart(&mut self) -> Result<()> {
        debug!("restarting racerd");
        self.stop();
        self.start()
    }

    /// Returns true only if a child exists and has not exited.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// The `host:port` the child is serving on, when running.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServerState {
        self.state
    }
}

impl Drop for RacerdServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reads the announce line from the child's stdout and extracts the
/// bind address.
fn discover_address(child: &mut Child) -> Result<String> {
    let stdout = child
        .stdout
        .as_mut()
        .ok_or_else(|| Error::Startup("no stdout handle on racerd process".to_string()))?;

    // The pipe stays attached to the child afterwards; only the first
    // line is consumed.
    let mut reader = BufReader::new(stdout);
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| Error::Startup(format!("failed to read announce line: {e}")))?;

    if read == 0 {
        return Err(Error::Startup(
            "racerd exited before announcing an address".to_string(),
        ));
    }

    parse_announce_line(&line)
}

/// Parses "racerd listening on host:port" into the bind address.
///
/// Token count is validated before indexing so a truncated line fails
/// cleanly instead of panicking.
fn parse_announce_line(line: &str) -> Result<String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < ANNOUNCE_MIN_TOKENS {
        return Err(Error::Startup(format!(
            "unexpected announce line from racerd: {line:?}"
        )));
    }
    Ok(tokens[ANNOUNCE_ADDRESS_INDEX].to_string())
}
