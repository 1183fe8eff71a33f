use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::ClipboardError;

/// Clipboard programs tried in order.
const CANDIDATES: &[(&str, &[&str])] = &[
    // macOS
    ("pbcopy", &[]),
    // Wayland
    ("wl-copy", &[]),
    // X11
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    // Windows
    ("clip", &[]),
];

/// Copy `content` with the first clipboard program that accepts it.
/// Returns the program used.
pub fn copy(content: &str) -> Result<&'static str, ClipboardError> {
    copy_with(CANDIDATES, content)
}

fn copy_with(
    candidates: &[(&'static str, &[&str])],
    content: &str,
) -> Result<&'static str, ClipboardError> {
    let mut last_failure = None;
    for &(prog, args) in candidates {
        match try_clipboard_prog(prog, args, content) {
            Ok(true) => return Ok(prog),
            Ok(false) => {
                debug!(program = prog, "clipboard program exited unsuccessfully");
                last_failure = Some(ClipboardError::Failed {
                    program: prog,
                    reason: "non-zero exit status".into(),
                });
            }
            // not installed
            Err(e) => debug!(program = prog, error = %e, "clipboard program unavailable"),
        }
    }
    Err(last_failure.unwrap_or(ClipboardError::Unavailable))
}

/// `Err` when the program could not be started, `Ok(success)` otherwise.
fn try_clipboard_prog(prog: &str, args: &[&str], content: &str) -> std::io::Result<bool> {
    let mut child = Command::new(prog)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        // a closed pipe shows up in the exit status
        let _ = stdin.write_all(content.as_bytes());
    }
    Ok(child.wait()?.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_programs_are_unavailable() {
        let candidates: &[(&'static str, &[&str])] = &[("tabgrid-no-such-clipboard-tool", &[])];
        assert!(matches!(
            copy_with(candidates, "x"),
            Err(ClipboardError::Unavailable)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn first_working_program_wins() {
        let candidates: &[(&'static str, &[&str])] = &[
            ("tabgrid-no-such-clipboard-tool", &[]),
            ("false", &[]),
            ("cat", &[]),
        ];
        assert_eq!(copy_with(candidates, "hello").ok(), Some("cat"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_reported() {
        let candidates: &[(&'static str, &[&str])] = &[("false", &[])];
        assert!(matches!(
            copy_with(candidates, "x"),
            Err(ClipboardError::Failed { program: "false", .. })
        ));
    }
}
