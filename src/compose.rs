//! Pull-and-recreate of a single compose service.

use crate::process::CommandRunner;
use log::{error, info};
use std::path::{Path, PathBuf};

/// Separator the host uses between entries of a path list.
#[cfg(windows)]
const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: char = ':';

/// Splits the compose `config_files` label into individual paths.
///
/// The first of the host path-list separator, `:` and `,` found in the
/// string is used for splitting; empty entries are dropped.
pub fn split_config_files(config_files: &str) -> Vec<String> {
    let separator = [PATH_LIST_SEPARATOR, ':', ',']
        .into_iter()
        .find(|sep| config_files.contains(*sep));

    let parts: Vec<&str> = match separator {
        Some(sep) => config_files.split(sep).collect(),
        None => vec![config_files],
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drives `docker pull` and `docker compose up` for one service.
pub struct ComposeUpdater<C> {
    runner: C,
    docker_bin: String,
}

impl<C: CommandRunner> ComposeUpdater<C> {
    pub fn new(runner: C, docker_bin: impl Into<String>) -> Self {
        Self {
            runner,
            docker_bin: docker_bin.into(),
        }
    }

    #[cfg(test)]
    pub fn runner(&self) -> &C {
        &self.runner
    }

    /// Pulls `image_ref`, then recreates `service_name`.
    ///
    /// A service that was running is brought up detached with a rebuild;
    /// a stopped one is only recreated, never started.  Success is decided
    /// by exit codes alone.  Every command runs in the resolved project
    /// directory; the process's own current directory is left untouched.
    pub async fn apply(
        &self,
        working_dir: &str,
        config_files: &str,
        image_ref: &str,
        service_name: &str,
        was_running: bool,
    ) -> bool {
        let Some(cwd) = resolve_working_dir(working_dir) else {
            return false;
        };

        let mut compose_args = vec!["compose".to_string()];
        for file in split_config_files(config_files) {
            compose_args.push("-f".to_string());
            compose_args.push(file);
        }

        info!("  Pulling image {} from registry...", image_ref);
        let pull_args = vec!["pull".to_string(), image_ref.to_string()];
        if !self.step("docker pull", &pull_args, &cwd).await {
            return false;
        }

        if was_running {
            info!("  Rebuilding and restarting service '{}'...", service_name);
            compose_args.extend(["up", "-d", "--build", service_name].map(String::from));
            self.step("docker compose up", &compose_args, &cwd).await
        } else {
            info!("  Container was stopped, updating service '{}' without starting it...", service_name);
            compose_args.extend(["up", "--no-start", service_name].map(String::from));
            let ok = self.step("docker compose up --no-start", &compose_args, &cwd).await;
            if ok {
                info!("  Image updated, container remains stopped");
            }
            ok
        }
    }

    async fn step(&self, label: &str, args: &[String], cwd: &Path) -> bool {
        match self.runner.run(&self.docker_bin, args, cwd).await {
            Ok(out) => {
                let text = out.output.trim_end();
                if !text.is_empty() {
                    info!("{}", text);
                }
                if out.success() {
                    true
                } else {
                    match out.code {
                        Some(code) => error!("  Error: {} returned {}", label, code),
                        None => error!("  Error: {} was terminated by a signal", label),
                    }
                    false
                }
            }
            Err(e) => {
                error!("  Error: {} could not be run: {:#}", label, e);
                false
            }
        }
    }
}

fn resolve_working_dir(working_dir: &str) -> Option<PathBuf> {
    let dir = if working_dir.is_empty() {
        match std::env::current_dir() {
            Ok(d) => d,
            Err(e) => {
                error!("  Unable to determine current directory: {}", e);
                return None;
            }
        }
    } else {
        PathBuf::from(working_dir)
    };

    if dir.is_dir() {
        Some(dir)
    } else {
        error!("  Unable to change directory to {}: not a directory", dir.display());
        None
    }
}
