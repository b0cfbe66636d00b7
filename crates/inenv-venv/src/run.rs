//! Launching commands with an environment's variables injected.
//!
//! Overrides are applied to the child's `Command` only; the calling process's
//! environment is never touched.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::error::{Result, VenvError};

/// Options forwarded to the process launch.
///
/// Streams left unset are inherited from the parent.
#[derive(Debug, Default)]
pub struct RunOptions {
    stdin: Option<Stdio>,
    stdout: Option<Stdio>,
    stderr: Option<Stdio>,
    current_dir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
    shell: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdin(mut self, cfg: impl Into<Stdio>) -> Self {
        self.stdin = Some(cfg.into());
        self
    }

    pub fn stdout(mut self, cfg: impl Into<Stdio>) -> Self {
        self.stdout = Some(cfg.into());
        self
    }

    pub fn stderr(mut self, cfg: impl Into<Stdio>) -> Self {
        self.stderr = Some(cfg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Extra variable for the child. Applied after the environment's own
    /// overrides, so it wins on conflict.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Join the argv with spaces and hand it to the platform shell, so
    /// variable references like `$VIRTUAL_ENV` expand in the child.
    /// Arguments are not quoted.
    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }
}

/// Spawn `command` with `overrides` layered over the inherited environment.
///
/// `search_path` is the PATH the program is resolved against in direct mode.
pub(crate) fn spawn<S: AsRef<OsStr>>(
    command: &[S],
    overrides: &[(OsString, OsString)],
    removed: &[&str],
    search_path: Option<&OsStr>,
    options: RunOptions,
) -> Result<Child> {
    let Some((program, args)) = command.split_first() else {
        return Err(VenvError::Spawn {
            program: String::new(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
        });
    };

    let mut cmd = if options.shell {
        shell_command(command)
    } else {
        let resolved = resolve_program(program.as_ref(), search_path, options.current_dir.as_deref());
        let mut c = Command::new(resolved);
        c.args(args);
        c
    };

    for key in removed {
        cmd.env_remove(key);
    }
    cmd.envs(overrides.iter().map(|(k, v)| (k, v)));
    cmd.envs(options.envs.iter().map(|(k, v)| (k, v)));
    if let Some(ref dir) = options.current_dir {
        cmd.current_dir(dir);
    }
    if let Some(stdin) = options.stdin {
        cmd.stdin(stdin);
    }
    if let Some(stdout) = options.stdout {
        cmd.stdout(stdout);
    }
    if let Some(stderr) = options.stderr {
        cmd.stderr(stderr);
    }

    let program_name = program.as_ref().to_string_lossy().to_string();
    tracing::debug!(program = %program_name, shell = options.shell, "spawning");
    cmd.spawn().map_err(|source| VenvError::Spawn {
        program: program_name,
        source,
    })
}

#[cfg(not(windows))]
fn shell_command<S: AsRef<OsStr>>(command: &[S]) -> Command {
    let mut c = Command::new("sh");
    c.arg("-c").arg(join_args(command));
    c
}

#[cfg(windows)]
fn shell_command<S: AsRef<OsStr>>(command: &[S]) -> Command {
    let mut c = Command::new("cmd");
    c.arg("/C").arg(join_args(command));
    c
}

fn join_args<S: AsRef<OsStr>>(command: &[S]) -> OsString {
    let mut line = OsString::new();
    for (i, part) in command.iter().enumerate() {
        if i > 0 {
            line.push(" ");
        }
        line.push(part);
    }
    line
}

/// Look a bare program name up on `search_path`; anything else (paths, misses)
/// is passed through for the OS to resolve.
fn resolve_program(program: &OsStr, search_path: Option<&OsStr>, cwd: Option<&Path>) -> PathBuf {
    let as_path = Path::new(program);
    if as_path.components().count() != 1 {
        return as_path.to_path_buf();
    }
    let Some(search_path) = search_path else {
        return as_path.to_path_buf();
    };
    let cwd = cwd
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    which::which_in(program, Some(search_path), cwd).unwrap_or_else(|_| as_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_args_no_quoting() {
        assert_eq!(join_args(&["echo", "$VIRTUAL_ENV"]), OsString::from("echo $VIRTUAL_ENV"));
    }

    #[test]
    fn test_empty_command_is_spawn_error() {
        let empty: [&str; 0] = [];
        let err = spawn(&empty, &[], &[], None, RunOptions::new()).unwrap_err();
        match err {
            VenvError::Spawn { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = spawn(
            &["inenv-definitely-not-a-program"],
            &[],
            &[],
            None,
            RunOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, VenvError::Spawn { .. }));
    }

    #[test]
    fn test_qualified_program_not_resolved() {
        let p = resolve_program(OsStr::new("./tool"), Some(OsStr::new("/nowhere")), None);
        assert_eq!(p, PathBuf::from("./tool"));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let mut child = spawn(&["false"], &[], &[], None, RunOptions::new()).unwrap();
        let status = child.wait().unwrap();
        assert!(!status.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_extra_env_wins_over_overrides() {
        let overrides = vec![(OsString::from("INENV_RUN_PROBE"), OsString::from("base"))];
        let child = spawn(
            &["echo", "$INENV_RUN_PROBE"],
            &overrides,
            &[],
            None,
            RunOptions::new()
                .shell(true)
                .stdout(Stdio::piped())
                .env("INENV_RUN_PROBE", "extra"),
        )
        .unwrap();
        let out = child.wait_with_output().unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "extra");
    }
}
