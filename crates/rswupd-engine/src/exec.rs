//! Subprocess runner
//!
//! The engine shells out for the operations the platform already does
//! well: `bspatch` for binary deltas, `tar` for archive extraction, and
//! `cp -af` as the hard-link fallback. Output is captured in memory and
//! folded into the error when the command fails, so a single diagnostic
//! line carries the subprocess's own complaint.

use rswupd_core::errors::{Result, UpdError, UpdErrorKind};
use std::ffi::OsStr;
use std::process::Command;

/// Run a command, discarding its output on success.
pub fn run_command_silent<S: AsRef<OsStr>>(cmd: &str, args: &[S]) -> Result<()> {
    run_command_output(cmd, args).map(|_| ())
}

/// Run a command and return its captured stdout.
///
/// ## Errors
///
/// `UpdErrorKind::Exec` when the command cannot be spawned or exits
/// non-zero; the error message embeds captured stdout/stderr.
pub fn run_command_output<S: AsRef<OsStr>>(cmd: &str, args: &[S]) -> Result<Vec<u8>> {
    let rendered = render_command(cmd, args);
    let output = Command::new(cmd).args(args).output().map_err(|e| {
        UpdError::new(UpdErrorKind::Exec)
            .with_op("run_command")
            .with_message(format!("failed to spawn {}: {}", rendered, e))
    })?;

    if !output.status.success() {
        let mut msg = format!("{} exited with {}", rendered, output.status);
        if !output.stdout.is_empty() {
            msg.push_str("\nSTDOUT:\n");
            msg.push_str(&String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            msg.push_str("\nSTDERR:\n");
            msg.push_str(&String::from_utf8_lossy(&output.stderr));
        }
        return Err(UpdError::new(UpdErrorKind::Exec)
            .with_op("run_command")
            .with_message(msg));
    }

    Ok(output.stdout)
}

fn render_command<S: AsRef<OsStr>>(cmd: &str, args: &[S]) -> String {
    let mut rendered = String::from(cmd);
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&arg.as_ref().to_string_lossy());
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_command_returns_stdout() {
        let out = run_command_output("sh", &["-c", "printf ok"]).unwrap();
        assert_eq!(out, b"ok");
    }

    #[test]
    fn test_failing_command_captures_streams() {
        let err = run_command_silent("sh", &["-c", "echo oops >&2; exit 3"]).unwrap_err();
        assert_eq!(err.kind(), UpdErrorKind::Exec);
        assert!(err.message().contains("oops"));
        assert!(err.message().contains("STDERR"));
    }

    #[test]
    fn test_missing_binary_is_exec_error() {
        let err = run_command_silent("rswupd-no-such-binary", &["x"]).unwrap_err();
        assert_eq!(err.kind(), UpdErrorKind::Exec);
        assert!(err.message().contains("failed to spawn"));
    }
}
