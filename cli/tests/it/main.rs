//! Tests running the `oob-update` binary.

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, Output, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use indoc::formatdoc;
use similar_asserts::assert_eq;

const BIN: &str = env!("CARGO_BIN_EXE_oob-update");

fn tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
    let td = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::try_from(td.path().to_owned()).unwrap();
    (td, dir)
}

fn write_config(dir: &Utf8Path, tools: &str) -> Utf8PathBuf {
    write_config_with_delegate(
        dir,
        tools,
        r#"[-c, 'printf "%s\n" "$@"; exit 6', delegate]"#,
    )
}

fn write_config_with_delegate(dir: &Utf8Path, tools: &str, delegate_args: &str) -> Utf8PathBuf {
    let path = dir.join("guard.yaml");
    let yaml = formatdoc! { r#"
        base_dir: {dir}
        tools: {tools}
        space:
          path: {dir}
          threshold_mb: 0
        dependency:
          name: requests
          probe: ["true"]
          fallback_dir: "{{base_dir}}/packages"
          install: []
        delegate:
          program: sh
          args: {delegate_args}
    "# };
    std::fs::write(&path, yaml).unwrap();
    path
}

fn guard_command<I, S>(config: &Utf8Path, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(BIN);
    cmd.args(args)
        .env("OOB_GUARD_CONFIG", config)
        .env("RUST_LOG", "warn");
    cmd
}

fn run<I, S>(config: &Utf8Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    guard_command(config, args).output().unwrap()
}

#[test]
fn test_forwards_verbatim() {
    let (_td, dir) = tempdir();
    let config = write_config(&dir, "[]");
    let out = run(&config, &["-H", "10.0.0.1", "--", "--help", "-v"]);
    assert_eq!(out.status.code(), Some(6));
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "-H\n10.0.0.1\n--\n--help\n-v\n"
    );
}

#[test]
fn test_missing_tools_exit_code() {
    let (_td, dir) = tempdir();
    let config = write_config(
        &dir,
        "[{name: one, probe: ['false']}, {name: two, probe: ['/nonexistent/two']}]",
    );
    let out = run(&config, &["-v"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Missing required tools: one, two"), "{stderr}");
}

#[test]
fn test_bad_config() {
    let (_td, dir) = tempdir();
    let config = dir.join("guard.yaml");
    std::fs::write(&config, "bogus: true\n").unwrap();
    let out = run(&config, [""; 0]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_forwards_non_utf8() {
    let (_td, dir) = tempdir();
    let config = write_config(&dir, "[]");
    let arg = OsStr::from_bytes(b"\xff-arg");
    let out = run(&config, [arg, OsStr::new("plain")]);
    assert_eq!(out.status.code(), Some(6));
    assert_eq!(out.stdout, b"\xff-arg\nplain\n");
}

#[test]
fn test_delegate_signal_is_the_wrapper_status() {
    let (_td, dir) = tempdir();
    let config = write_config_with_delegate(&dir, "[]", "[-c, 'kill -TERM $$']");
    let out = run(&config, ["-v"]);
    assert_eq!(out.status.code(), None);
    assert_eq!(out.status.signal(), Some(15));
}

#[test]
fn test_interrupt_is_handled_by_delegate() {
    let (_td, dir) = tempdir();
    let config = write_config_with_delegate(
        &dir,
        "[]",
        r#"[-c, "trap 'echo cleanup; exit 7' INT; echo ready; while :; do sleep 0.05; done"]"#,
    );
    // Own process group, so the interrupt reaches exactly what a terminal
    // Ctrl-C would: the wrapper and everything it started.
    let mut child = guard_command(&config, ["-v"])
        .stdout(Stdio::piped())
        .process_group(0)
        .spawn()
        .unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let mut line = String::new();
    stdout.read_line(&mut line).unwrap();
    assert_eq!(line, "ready\n");
    let pgid = rustix::process::Pid::from_child(&child);
    rustix::process::kill_process_group(pgid, rustix::process::Signal::Int).unwrap();
    let status = child.wait().unwrap();
    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "cleanup\n");
    assert_eq!(status.code(), Some(7));
}
