//! Subprocess invocation.
//!
//! Pulls and compose commands are run through [`CommandRunner`] with an
//! explicit working directory, so the process-wide current directory is
//! never changed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// stdout and stderr lines in the order they arrived.
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` inside `cwd` and waits for it to exit.
    ///
    /// An `Err` means the process could not be started at all.
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<CommandOutput>;
}

/// Runs commands on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<CommandOutput> {
        debug!("Running: {} {} (in {})", program, args.join(" "), cwd.display());
        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to run {} in {}", program, cwd.display()))?;

        let stdout = child.stdout.take().context("stdout not captured")?;
        let stderr = child.stderr.take().context("stderr not captured")?;
        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);

        // Partial reads stay in the per-stream buffers when the other
        // branch wins, so a line is only emitted once it is complete.
        let (mut out_buf, mut err_buf) = (Vec::new(), Vec::new());
        let (mut out_open, mut err_open) = (true, true);
        let mut text = String::new();
        while out_open || err_open {
            tokio::select! {
                n = stdout.read_until(b'\n', &mut out_buf), if out_open => {
                    out_open = n? > 0;
                    drain_line(&mut out_buf, &mut text);
                }
                n = stderr.read_until(b'\n', &mut err_buf), if err_open => {
                    err_open = n? > 0;
                    drain_line(&mut err_buf, &mut text);
                }
            }
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("failed to wait for {}", program))?;
        Ok(CommandOutput {
            code: status.code(),
            output: text,
        })
    }
}

fn drain_line(buf: &mut Vec<u8>, text: &mut String) {
    text.push_str(&String::from_utf8_lossy(buf));
    buf.clear();
}
