use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use is_terminal::IsTerminal;
use tempfile::Builder;

/// The external editor invocation. Resolved once at startup and passed in
/// explicitly so the session itself never reads the environment.
#[derive(Debug, Clone)]
pub struct EditorCommand {
    command: String,
}

impl EditorCommand {
    pub fn from_env() -> Result<Self> {
        Self::from_value(std::env::var("EDITOR").ok())
    }

    fn from_value(value: Option<String>) -> Result<Self> {
        match value {
            Some(command) if !command.trim().is_empty() => Ok(Self { command }),
            _ => bail!("EDITOR environment variable is not set"),
        }
    }

    #[cfg(test)]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The command may carry its own arguments ("code -w"), so it is handed
    /// to the shell verbatim; only the buffer path gets quoted.
    fn shell_invocation(&self, buffer: &Path) -> String {
        format!("{} {}", self.command, quote_path(buffer))
    }
}

/// Present the lines in the user's editor and return the edited lines.
///
/// The buffer file is removed when this function returns, on success and on
/// every error path.
pub fn edit_path_list(editor: &EditorCommand, lines: &[String]) -> Result<Vec<String>> {
    let mut buffer = Builder::new()
        .prefix("edmv-")
        .suffix(".txt")
        .tempfile()
        .context("creating temporary buffer")?;
    buffer
        .write_all(lines.join("\n").as_bytes())
        .context("writing temporary buffer")?;
    buffer.flush().context("flushing temporary buffer")?;

    if !stdio_is_interactive() {
        eprintln!("warning: standard streams are not a terminal; the editor may not be interactive");
    }

    let status = Command::new("sh")
        .arg("-c")
        .arg(editor.shell_invocation(buffer.path()))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("launching editor '{}'", editor.command))?;
    if !status.success() {
        bail!("editor '{}' exited with {status}", editor.command);
    }

    // Re-read by path: many editors replace the file on save instead of
    // rewriting it in place.
    let content = fs::read_to_string(buffer.path())
        .with_context(|| format!("reading edited buffer {}", buffer.path().display()))?;
    Ok(parse_buffer(&content))
}

/// Strip trailing whitespace from the whole buffer, then split on newlines.
/// Leading and interior whitespace belongs to the paths and is preserved.
fn parse_buffer(content: &str) -> Vec<String> {
    content.trim_end().split('\n').map(str::to_string).collect()
}

fn stdio_is_interactive() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

/// Quote a path for sh -c execution (always quotes).
fn quote_path(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_value_rejects_unset_editor() {
        let err = EditorCommand::from_value(None).unwrap_err();
        assert!(err.to_string().contains("EDITOR"));
    }

    #[test]
    fn from_value_rejects_blank_editor() {
        assert!(EditorCommand::from_value(Some("   ".into())).is_err());
    }

    #[test]
    fn from_value_accepts_command_with_arguments() {
        let editor = EditorCommand::from_value(Some("code -w".into())).expect("editor");
        assert_eq!(
            editor.shell_invocation(Path::new("/tmp/buf.txt")),
            "code -w '/tmp/buf.txt'"
        );
    }

    #[test]
    fn quote_path_wraps_spaces_and_quotes() {
        assert_eq!(quote_path(Path::new("/tmp/a b.txt")), "'/tmp/a b.txt'");
        assert_eq!(quote_path(Path::new("/tmp/it's")), "'/tmp/it'\\''s'");
    }

    #[test]
    fn parse_buffer_strips_only_trailing_whitespace() {
        assert_eq!(
            parse_buffer("/a/one.txt\n/b/two.txt\n\n  \n"),
            vec!["/a/one.txt".to_string(), "/b/two.txt".to_string()]
        );
    }

    #[test]
    fn parse_buffer_keeps_interior_blank_lines() {
        assert_eq!(
            parse_buffer("/a/one.txt\n\n/b/two.txt"),
            vec![
                "/a/one.txt".to_string(),
                String::new(),
                "/b/two.txt".to_string()
            ]
        );
    }
}

#[cfg(all(test, unix))]
mod session_tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use tempfile::tempdir;

    use super::{EditorCommand, edit_path_list};

    fn fake_editor(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("editor.sh");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write editor script");
        let mut perms = fs::metadata(&path).expect("script metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod editor script");
        path
    }

    #[test]
    fn no_op_editor_returns_lines_unchanged() {
        let lines = vec!["/tmp/a.txt".to_string(), "/tmp/b.txt".to_string()];
        let edited = edit_path_list(&EditorCommand::new("true"), &lines).expect("session");
        assert_eq!(edited, lines);
    }

    #[test]
    fn rewriting_editor_output_is_returned() {
        let temp = tempdir().expect("temp dir");
        let script = fake_editor(temp.path(), "printf '%s' '/renamed/elsewhere.txt' > \"$1\"");
        let lines = vec!["/tmp/a.txt".to_string()];
        let edited =
            edit_path_list(&EditorCommand::new(script.display().to_string()), &lines)
                .expect("session");
        assert_eq!(edited, vec!["/renamed/elsewhere.txt".to_string()]);
    }

    #[test]
    fn trailing_newline_added_by_editor_is_ignored() {
        let temp = tempdir().expect("temp dir");
        // Rewrites the buffer with a final newline, the way most editors save.
        let script = fake_editor(
            temp.path(),
            "awk '{print}' \"$1\" > \"$1.rewrite\"\nmv \"$1.rewrite\" \"$1\"",
        );
        let lines = vec!["/tmp/a.txt".to_string(), "/tmp/b.txt".to_string()];
        let edited =
            edit_path_list(&EditorCommand::new(script.display().to_string()), &lines)
                .expect("session");
        assert_eq!(edited, lines);
    }

    #[test]
    fn failing_editor_is_an_error() {
        let lines = vec!["/tmp/a.txt".to_string()];
        let err = edit_path_list(&EditorCommand::new("false"), &lines).unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[test]
    fn missing_editor_is_an_error() {
        let lines = vec!["/tmp/a.txt".to_string()];
        let result = edit_path_list(&EditorCommand::new("edmv-no-such-editor"), &lines);
        assert!(result.is_err());
    }
}
