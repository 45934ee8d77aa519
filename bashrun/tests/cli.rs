use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn bashrun() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bashrun"));
    cmd.env_remove("DEBUG").env_remove("RUST_LOG");
    cmd
}

fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write script");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_cli_help() {
    let output = bashrun().arg("--help").output().unwrap();

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Run a command in bash"));
    assert!(out.contains("--source"));
    assert!(out.contains("--export"));
    assert!(out.contains("--clean-env"));
}

#[test]
fn test_runs_sourced_function_with_args() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "main.bash", "main() { echo \"args:$#:$1:$2\"; }\n");

    let output = bashrun()
        .arg("-s")
        .arg(&script)
        .args(["main", "a b", "it's"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "args:2:a b:it's\n");
}

#[test]
fn test_exit_status_is_mirrored() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "main.bash", "main() { return 5; }\n");

    let output = bashrun().arg("-s").arg(&script).arg("main").output().unwrap();

    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_later_source_wins() {
    let dir = TempDir::new().unwrap();
    let first = write_script(dir.path(), "first.bash", "NAME=first\nmain() { echo \"$NAME\"; }\n");
    let second = write_script(dir.path(), "second.bash", "NAME=second\n");

    let output = bashrun()
        .arg("--source")
        .arg(&first)
        .arg("--source")
        .arg(&second)
        .arg("main")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout(&output), "second\n");
}

#[test]
fn test_help_callback_lists_functions() {
    // A bare `help` argument would be taken as a request for usage text.
    let output = bashrun().arg("help;").output().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("Built in functions:\n"));
    assert!(out.contains(":: help\n"));
    assert!(out.contains(":: log\n"));
}

#[test]
fn test_log_callback_reaches_host_log() {
    let output = bashrun()
        .args(["log", "warn", "from the script"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stderr(&output).contains("from the script"));
}

#[test]
fn test_log_callback_bad_level() {
    let output = bashrun().args(["log", "loud", "x"]).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unknown level"));
}

#[test]
fn test_unknown_callback_exit_status() {
    let output = bashrun().args(["::", "no_such_function"]).output().unwrap();

    assert_eq!(output.status.code(), Some(6));
}

#[test]
fn test_exports_with_clean_env() {
    let output = bashrun()
        .env("LEAKED", "yes")
        .args(["--clean-env", "-e", "GREETING=hi", "-e", "GREETING=hello"])
        .arg(r#"echo "$GREETING:${LEAKED:-unset}""#)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "hello:unset\n");
}

#[test]
fn test_inherits_environment_by_default() {
    let output = bashrun()
        .env("INHERITED", "present")
        .arg(r#"echo "$INHERITED""#)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout(&output), "present\n");
}

#[test]
fn test_non_utf8_callback_argument() {
    let output = bashrun().arg(r"log warn $'caf\xe9'").output().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("caf\u{FFFD}"));
}

#[test]
#[cfg(unix)]
fn test_non_utf8_environment_is_skipped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let output = bashrun()
        .env("NOT_UTF8", OsStr::from_bytes(b"\xff"))
        .env("PLAIN", "kept")
        .arg(r#"echo "${NOT_UTF8-unset}:$PLAIN""#)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "unset:kept\n");
}

#[test]
fn test_invalid_export() {
    let output = bashrun().args(["-e", "novalue", "true"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("expected NAME=VALUE"));
}

#[test]
fn test_missing_source_fails_before_running() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.bash");
    let marker = dir.path().join("ran");

    let output = bashrun()
        .arg("-s")
        .arg(&missing)
        .arg(format!("touch {}", marker.display()))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cannot read source file"));
    assert!(!marker.exists());
}
