// Shared test helpers for integration tests.
// Used by cli_contract.rs and cli_flows.rs.
#![allow(dead_code)]

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

pub fn binary_path() -> PathBuf {
    let path = PathBuf::from(env!("CARGO_BIN_EXE_confq"));
    assert!(path.exists(), "binary not found at {}", path.display());
    path
}

pub fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_str()
        .expect("fixture path is UTF-8")
        .to_string()
}

fn command(args: &[&str]) -> Command {
    let mut cmd = Command::new(binary_path());
    cmd.args(args)
        .env_remove("CONFQ_CONFIG")
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Runs the binary with `stdin_input` written to a pipe on stdin.
/// Returns (stdout, stderr, exit_code).
pub fn run_piped(stdin_input: &str, args: &[&str]) -> (String, String, i32) {
    run_piped_with(command(args), stdin_input)
}

/// Like [`run_piped`], with extra environment variables.
pub fn run_piped_env(
    stdin_input: &str,
    args: &[&str],
    env: &[(&str, &str)],
) -> (String, String, i32) {
    let mut cmd = command(args);
    for (key, value) in env {
        cmd.env(key, value);
    }
    run_piped_with(cmd, stdin_input)
}

fn run_piped_with(mut cmd: Command, stdin_input: &str) -> (String, String, i32) {
    let output = cmd
        .stdin(Stdio::piped())
        .spawn()
        .and_then(|mut child| {
            let write_result = child
                .stdin
                .take()
                .unwrap()
                .write_all(stdin_input.as_bytes());
            if let Err(e) = write_result {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e);
                }
            }
            child.wait_with_output()
        })
        .expect("failed to execute binary");

    (
        String::from_utf8(output.stdout).expect("stdout not valid UTF-8"),
        String::from_utf8(output.stderr).expect("stderr not valid UTF-8"),
        output.status.code().unwrap_or(-1),
    )
}

/// Runs the binary with stdin redirected from the file at `path`.
pub fn run_redirected(path: &Path, args: &[&str]) -> (String, String, i32) {
    let file = File::open(path).expect("failed to open stdin file");
    run_bounded(command(args).stdin(Stdio::from(file)))
}

/// Runs the binary with stdin connected to the null device.
pub fn run_null(args: &[&str]) -> (String, String, i32) {
    run_bounded(command(args).stdin(Stdio::null()))
}

fn run_bounded(cmd: &mut Command) -> (String, String, i32) {
    wait_bounded(cmd.spawn().expect("failed to execute binary"))
}

/// Wait up to ten seconds, then kill the child and fail the test.
fn wait_bounded(mut child: Child) -> (String, String, i32) {
    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().expect("failed to poll child") {
            break status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("binary did not exit within 10s");
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    let mut stdout = String::new();
    let mut stderr = String::new();
    if let Some(mut out) = child.stdout.take() {
        out.read_to_string(&mut stdout).expect("stdout not valid UTF-8");
    }
    if let Some(mut err) = child.stderr.take() {
        err.read_to_string(&mut stderr).expect("stderr not valid UTF-8");
    }
    (stdout, stderr, status.code().unwrap_or(-1))
}

/// Parses stdout as a single JSON document.
pub fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout.trim()).expect("stdout should be valid JSON")
}
