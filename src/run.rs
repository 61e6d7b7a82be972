//! Blocking subprocess execution.

use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};

/// Outcome of [`run_command`].
///
/// `stdout` and `stderr` are empty unless capture was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Run `args[0]` with the remaining arguments and wait for it.
///
/// When the program can't be started, `code` holds the OS error number (or
/// `-1` when there is none) and a diagnostic is printed unless `quiet`.
/// A child killed by a signal also reports `-1`.
pub fn run_command<S: AsRef<str>>(
    args: &[S],
    working_dir: Option<&Path>,
    quiet: bool,
    capture_stdout: bool,
    capture_stderr: bool,
) -> CommandResult {
    let Some((program, rest)) = args.split_first() else {
        return CommandResult {
            code: -1,
            ..Default::default()
        };
    };

    let mut cmd = Command::new(program.as_ref());
    cmd.args(rest.iter().map(AsRef::as_ref));
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::inherit());
    cmd.stdout(if capture_stdout {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.stderr(if capture_stderr {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });

    match cmd.output() {
        Ok(output) => CommandResult {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Err(e) => {
            if !quiet {
                let line: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
                eprintln!(
                    "{} Command line \"{}\" generated error {}",
                    "x".red(),
                    line.join(" "),
                    e
                );
            }
            CommandResult {
                code: e.raw_os_error().unwrap_or(-1),
                ..Default::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_reports_os_error() {
        let result = run_command(
            &["burger-no-such-program-xyz"],
            None,
            true,
            true,
            true,
        );
        assert_ne!(result.code, 0);
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn test_empty_args() {
        let result = run_command::<&str>(&[], None, true, false, false);
        assert_eq!(result.code, -1);
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_stdout_and_exit_code() {
        let result = run_command(&["sh", "-c", "echo hello; exit 3"], None, true, true, true);
        assert_eq!(result.code, 3);
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_command(&["pwd"], Some(dir.path()), true, true, false);
        assert!(result.success());
        let reported = std::fs::canonicalize(result.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }
}
