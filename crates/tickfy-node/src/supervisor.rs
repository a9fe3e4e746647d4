//! Ownership of the single node daemon process.
//!
//! The handle lives behind one mutex; at most one child exists at a time.
//! Each started child gets:
//!
//! - two reader threads, one per output pipe, copying lines into the log
//!   buffer until the pipe closes;
//! - one watcher thread polling for exit. On exit it clears the handle, but
//!   only if the handle still belongs to the start that spawned it, so a
//!   watcher outliving a stop/start cycle cannot clear the newer process.
//!
//! The handle mutex and the log buffer's lock are never held together: log
//! lines are written after the handle guard is dropped.

use crate::error::NodeError;
use crate::logs::LogBuffer;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tickfy_vault::DaemonProbe;

/// Default interval between exit checks.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How the daemon is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisionMode {
    /// The daemon binary itself.
    Direct,
    /// The daemon under the upgrade supervisor, which swaps binaries at
    /// upgrade heights.
    Wrapped,
}

impl SupervisionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Wrapped => "cosmovisor",
        }
    }
}

/// What to execute.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Added on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub mode: SupervisionMode,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>, mode: SupervisionMode) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            mode,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

struct DaemonHandle {
    child: Child,
    mode: SupervisionMode,
    generation: u64,
}

type SharedHandle = Arc<Mutex<Option<DaemonHandle>>>;

/// Counts one live reader or watcher thread until dropped.
struct WorkerToken(Arc<AtomicUsize>);

impl WorkerToken {
    fn new(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count.clone())
    }
}

impl Drop for WorkerToken {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn lock(handle: &Mutex<Option<DaemonHandle>>) -> MutexGuard<'_, Option<DaemonHandle>> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

fn describe_exit(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: R, logs: Arc<LogBuffer>, token: WorkerToken) {
    thread::spawn(move || {
        let _token = token;
        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line);
                    logs.push(text.trim_end_matches(|c| c == '\n' || c == '\r'));
                }
            }
        }
    });
}

fn spawn_watcher(
    handle: SharedHandle,
    logs: Arc<LogBuffer>,
    generation: u64,
    interval: Duration,
    token: WorkerToken,
) {
    thread::spawn(move || {
        let _token = token;
        watch(&handle, &logs, generation, interval);
    });
}

fn watch(handle: &Mutex<Option<DaemonHandle>>, logs: &LogBuffer, generation: u64, interval: Duration) {
    loop {
        thread::sleep(interval);

        let exit = {
            let mut guard = lock(handle);
            let Some(current) = guard.as_mut() else { return };
            if current.generation != generation {
                return;
            }
            match current.child.try_wait() {
                Ok(None) => continue,
                Ok(Some(status)) => {
                    let mode = current.mode;
                    *guard = None;
                    (mode, describe_exit(&status))
                }
                Err(e) => {
                    let mode = current.mode;
                    *guard = None;
                    (mode, format!("wait failed: {}", e))
                }
            }
        };

        log::warn!("node process exited ({})", exit.1);
        logs.push(&format!("Node stopped ({}, {})", exit.0.as_str(), exit.1));
        return;
    }
}

/// Starts, stops and watches the daemon.
pub struct Supervisor {
    handle: SharedHandle,
    logs: Arc<LogBuffer>,
    workers: Arc<AtomicUsize>,
    next_generation: AtomicU64,
    poll_interval: Duration,
}

impl Supervisor {
    pub fn new(logs: Arc<LogBuffer>) -> Self {
        Self::with_poll_interval(logs, EXIT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(logs: Arc<LogBuffer>, poll_interval: Duration) -> Self {
        Self {
            handle: Arc::new(Mutex::new(None)),
            logs,
            workers: Arc::new(AtomicUsize::new(0)),
            next_generation: AtomicU64::new(1),
            poll_interval,
        }
    }

    pub fn logs(&self) -> &Arc<LogBuffer> {
        &self.logs
    }

    /// Launch `spec`. Returns the child's pid.
    pub fn start(&self, spec: LaunchSpec) -> Result<u32, NodeError> {
        let (pid, generation) = {
            let mut guard = lock(&self.handle);
            if guard.is_some() {
                return Err(NodeError::AlreadyRunning);
            }

            let mut command = Command::new(&spec.program);
            command
                .args(&spec.args)
                .envs(spec.env.iter().map(|(k, v)| (k, v)))
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());

            let mut child = command.spawn().map_err(|source| NodeError::Spawn {
                program: spec.program.display().to_string(),
                source,
            })?;

            if let Some(stdout) = child.stdout.take() {
                spawn_reader(stdout, self.logs.clone(), WorkerToken::new(&self.workers));
            }
            if let Some(stderr) = child.stderr.take() {
                spawn_reader(stderr, self.logs.clone(), WorkerToken::new(&self.workers));
            }

            let pid = child.id();
            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
            *guard = Some(DaemonHandle {
                child,
                mode: spec.mode,
                generation,
            });
            (pid, generation)
        };

        log::info!("node started ({}, pid {})", spec.mode.as_str(), pid);
        self.logs
            .push(&format!("Node started ({}, pid {})", spec.mode.as_str(), pid));
        spawn_watcher(
            self.handle.clone(),
            self.logs.clone(),
            generation,
            self.poll_interval,
            WorkerToken::new(&self.workers),
        );
        Ok(pid)
    }

    /// Kill the daemon and reap it.
    pub fn stop(&self) -> Result<(), NodeError> {
        let mode = {
            let mut guard = lock(&self.handle);
            let Some(mut daemon) = guard.take() else {
                return Err(NodeError::NotRunning);
            };
            if let Err(e) = daemon.child.kill() {
                log::debug!("kill: {}", e);
            }
            if let Err(e) = daemon.child.wait() {
                log::debug!("wait: {}", e);
            }
            daemon.mode
        };

        log::info!("node stopped ({})", mode.as_str());
        self.logs.push(&format!("Node stopped ({})", mode.as_str()));
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.handle).is_some()
    }

    /// No daemon and no thread left that could still append to the log.
    ///
    /// The exit line is pushed after the handle is cleared, so callers that
    /// want the complete output of a finished daemon wait for this rather
    /// than for `!is_running()`.
    pub fn is_settled(&self) -> bool {
        !self.is_running() && self.workers.load(Ordering::SeqCst) == 0
    }

    pub fn pid(&self) -> Option<u32> {
        lock(&self.handle).as_ref().map(|d| d.child.id())
    }

    pub fn mode(&self) -> Option<SupervisionMode> {
        lock(&self.handle).as_ref().map(|d| d.mode)
    }
}

impl DaemonProbe for Supervisor {
    fn is_daemon_running(&self) -> bool {
        self.is_running()
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Some(mut daemon) = lock(&self.handle).take() {
            let _ = daemon.child.kill();
            let _ = daemon.child.wait();
        }
    }
}
