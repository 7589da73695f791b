//! Supervised external processes (the workload and an optional tunnel).

use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use hostsync_core::ProcessConfig;

use crate::error::{process_err, RunnerError};

pub trait ProcessSupervisor {
    /// Start `process` with `cwd` as its working directory.
    fn start(&mut self, process: &ProcessConfig, cwd: &Path) -> Result<(), RunnerError>;

    /// Block until every started process has exited.
    fn wait_all(&mut self) -> Result<(), RunnerError>;
}

/// Runs processes with `std::process::Command`.
#[derive(Debug, Default)]
pub struct CommandSupervisor {
    children: Vec<(String, Child)>,
}

impl CommandSupervisor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessSupervisor for CommandSupervisor {
    fn start(&mut self, process: &ProcessConfig, cwd: &Path) -> Result<(), RunnerError> {
        let child = Command::new(&process.command)
            .args(&process.args)
            .current_dir(cwd)
            .spawn()
            .map_err(|e| process_err(&process.command, e))?;
        tracing::info!(command = %process.command, pid = child.id(), "started");
        self.children.push((process.command.clone(), child));
        Ok(())
    }

    fn wait_all(&mut self) -> Result<(), RunnerError> {
        for (command, mut child) in self.children.drain(..) {
            let status = child.wait().map_err(|e| process_err(&command, e))?;
            tracing::info!(%command, %status, "exited");
        }
        Ok(())
    }
}

/// Fail with `DependencyMissing` for the first `required` path that does
/// not exist. Relative paths are resolved against `root`.
pub fn check_dependencies(required: &[PathBuf], root: &Path) -> Result<(), RunnerError> {
    for path in required {
        let resolved = if path.is_absolute() {
            path.clone()
        } else {
            root.join(path)
        };
        if !resolved.exists() {
            return Err(RunnerError::DependencyMissing { path: resolved });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_dependency_is_reported_with_path() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("server.jar"), b"jar").unwrap();

        check_dependencies(&[PathBuf::from("server.jar")], tmp.path()).unwrap();
        let err = check_dependencies(
            &[PathBuf::from("server.jar"), PathBuf::from("jre/bin/java")],
            tmp.path(),
        )
        .unwrap_err();
        match err {
            RunnerError::DependencyMissing { path } => assert!(path.ends_with("jre/bin/java")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_command_fails_to_start() {
        let tmp = TempDir::new().unwrap();
        let mut supervisor = CommandSupervisor::new();
        let process = ProcessConfig {
            command: "hostsync-definitely-not-a-command".into(),
            args: vec![],
        };
        let err = supervisor.start(&process, tmp.path()).unwrap_err();
        assert!(matches!(err, RunnerError::Process { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn waits_for_started_processes() {
        let tmp = TempDir::new().unwrap();
        let mut supervisor = CommandSupervisor::new();
        let process = ProcessConfig {
            command: "sh".into(),
            args: vec!["-c".into(), "echo done > out.txt".into()],
        };
        supervisor.start(&process, tmp.path()).unwrap();
        supervisor.wait_all().unwrap();
        assert!(tmp.path().join("out.txt").exists());
    }
}
