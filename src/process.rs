use std::fmt;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::runtime::Runtime;

use crate::sanitize;

/// Cadence of the animated wait: liveness poll and progress repaint.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const DEFAULT_CAPTURE_LIMIT: usize = 50;

/// Bytes kept of a single captured line. The rest of the line is discarded.
pub const MAX_LINE_BYTES: usize = 4096;

/// How long runtime shutdown waits for blocking reads, such as the ENTER
/// prompt after an interactive command, before abandoning them.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// A program plus its argument vector. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Indexes into `args` that are masked when the command is displayed.
    secret: Vec<usize>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            secret: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// An argument that must never show up in logs or popups.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for (index, arg) in self.args.iter().enumerate() {
            if self.secret.contains(&index) {
                write!(f, " ****")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// stdio detached, run to completion.
    Quiet,
    /// stdout read line by line, sanitized, at most `limit` lines kept.
    Capture { limit: usize },
    /// polled until exit; the process group is terminated after `timeout`.
    Animated { timeout: Duration },
    /// the real terminal is handed to the child, then the operator presses Enter.
    Interactive,
    /// terminal attached on stdin/stderr, the first stdout line is the answer.
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    Success,
    Failed(Option<i32>),
    Signaled(i32),
    TimedOut,
    NotLaunched(String),
}

impl From<ExitStatus> for Exit {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            Exit::Success
        } else if let Some(signal) = status.signal() {
            Exit::Signaled(signal)
        } else {
            Exit::Failed(status.code())
        }
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exit::Success => write!(f, "success"),
            Exit::Failed(Some(code)) => write!(f, "exit code {code}"),
            Exit::Failed(None) => write!(f, "failed"),
            Exit::Signaled(signal) => write!(f, "killed by signal {signal}"),
            Exit::TimedOut => write!(f, "timed out"),
            Exit::NotLaunched(reason) => write!(f, "could not be started: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit: Exit,
    pub lines: Vec<String>,
}

impl ProcessResult {
    pub fn new(exit: Exit, lines: Vec<String>) -> Self {
        Self { exit, lines }
    }

    pub fn from_exit(exit: Exit) -> Self {
        Self::new(exit, Vec::new())
    }

    pub fn success(&self) -> bool {
        self.exit == Exit::Success
    }

    pub fn not_launched(&self) -> bool {
        matches!(self.exit, Exit::NotLaunched(_))
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Launches collaborators. The engine only talks to this trait so the
/// navigation flow can be driven without real tools.
#[async_trait]
pub trait Runner: Send {
    async fn run(&mut self, command: &CommandSpec, mode: Mode) -> ProcessResult;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl Runner for SystemRunner {
    async fn run(&mut self, command: &CommandSpec, mode: Mode) -> ProcessResult {
        debug!("running `{command}` in {mode:?} mode");

        let result = match mode {
            Mode::Quiet => run_quiet(command).await,
            Mode::Capture { limit } => run_capture(command, limit).await,
            Mode::Animated { timeout } => run_animated(command, timeout).await,
            Mode::Interactive => run_interactive(command).await,
            Mode::Prompt => run_prompt(command).await,
        };

        match result {
            Ok(result) => {
                info!("`{command}` finished: {}", result.exit);
                result
            }
            Err(e) => {
                warn!("`{command}` could not be started: {e}");
                ProcessResult::from_exit(Exit::NotLaunched(format!("{}: {e}", command.program)))
            }
        }
    }
}

async fn run_quiet(command: &CommandSpec) -> io::Result<ProcessResult> {
    let status = command
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await?;

    Ok(ProcessResult::from_exit(status.into()))
}

async fn run_capture(command: &CommandSpec, limit: usize) -> io::Result<ProcessResult> {
    let mut child = command
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let mut lines = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();

        while lines.len() < limit {
            if !read_bounded_line(&mut reader, &mut buf).await? {
                break;
            }
            if let Some(line) = sanitize::filter_line(&String::from_utf8_lossy(&buf)) {
                lines.push(line);
            }
        }

        if lines.len() == limit {
            debug!("`{command}` reached the {limit} line ceiling");
        }
        // dropping the reader closes the pipe so a chatty child cannot block on it
    }

    let status = child.wait().await?;
    Ok(ProcessResult::new(status.into(), lines))
}

/// Reads one line into `buf`, keeping at most [`MAX_LINE_BYTES`] of it.
/// Returns `false` at end of output.
async fn read_bounded_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut read_any = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(read_any);
        }
        read_any = true;

        let (chunk, complete) = match available.iter().position(|&b| b == b'\n') {
            Some(end) => (&available[..=end], true),
            None => (available, false),
        };
        let room = MAX_LINE_BYTES.saturating_sub(buf.len());
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);

        let used = chunk.len();
        reader.consume(used);
        if complete {
            return Ok(true);
        }
    }
}

async fn run_animated(command: &CommandSpec, timeout: Duration) -> io::Result<ProcessResult> {
    let mut child = command
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .kill_on_drop(true)
        .spawn()?;

    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(ProcessResult::from_exit(status.into()));
        }

        let elapsed = started.elapsed();
        if elapsed >= timeout {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL.min(timeout - elapsed)).await;
    }

    warn!("`{command}` still running after {timeout:?}, terminating");
    terminate_group(&mut child).await?;
    Ok(ProcessResult::from_exit(Exit::TimedOut))
}

/// SIGTERM to the child's process group, SIGKILL if it is still around one
/// poll interval later. The child is always reaped.
async fn terminate_group(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let group = pid as libc::pid_t;

    // SAFETY: the child was spawned with process_group(0), so its pid is the
    // id of a group that only contains the child and its descendants.
    unsafe { libc::killpg(group, libc::SIGTERM) };
    if tokio::time::timeout(POLL_INTERVAL, child.wait()).await.is_ok() {
        return Ok(());
    }

    // SAFETY: see above.
    unsafe { libc::killpg(group, libc::SIGKILL) };
    child.wait().await.map(|_| ())
}

async fn run_interactive(command: &CommandSpec) -> io::Result<ProcessResult> {
    println!("\n--- Executing `{command}`, please follow prompts in terminal ---\n");

    let exit = match command
        .to_command()
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .status()
        .await
    {
        Ok(status) => Exit::from(status),
        Err(e) => {
            println!("Failed to run {}: {e}", command.program);
            Exit::NotLaunched(format!("{}: {e}", command.program))
        }
    };

    println!("\n--- Command finished, press ENTER to return to the menu ---");
    wait_for_enter().await?;

    Ok(ProcessResult::from_exit(exit))
}

async fn wait_for_enter() -> io::Result<()> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(())
}

/// Shuts the runtime down without waiting on a stdin read that nobody
/// will answer.
pub fn shutdown(runtime: Runtime) {
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
}

async fn run_prompt(command: &CommandSpec) -> io::Result<ProcessResult> {
    let output = command
        .to_command()
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .output()
        .await?;

    let answer = String::from_utf8_lossy(&output.stdout);
    let lines = answer
        .lines()
        .next()
        .map(|line| vec![line.to_string()])
        .unwrap_or_default();

    Ok(ProcessResult::new(output.status.into(), lines))
}
