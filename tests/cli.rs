use std::process::{Command, Output};

/// Runs the binary with logging switched off, so anything that still shows
/// up on stderr is printed regardless of RUST_LOG.
fn run(args: &[&str]) -> Output {
    run_logging(args, "off")
}

fn run_logging(args: &[&str], log_filter: &str) -> Output {
    let dir = tempfile::tempdir().unwrap();
    Command::new(env!("CARGO_BIN_EXE_ticket-relay"))
        .args(args)
        .current_dir(dir.path())
        .env("RUST_LOG", log_filter)
        .output()
        .expect("failed to run ticket-relay")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_missing_printer_port() {
    let output = run(&["-p", "/dev/ttyUSB0"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = stderr(&output);
    assert!(
        stderr.contains("Error: printer port must be defined"),
        "stderr: {stderr}"
    );
    assert!(stderr.contains("--help"), "stderr: {stderr}");
}

#[test]
fn test_missing_station_port() {
    let output = run(&["-o", "/dev/ttyUSB1"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = stderr(&output);
    assert!(stderr.contains("Error: port must be defined"), "stderr: {stderr}");
}

#[test]
fn test_help() {
    let output = run(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--printport"), "stdout: {stdout}");
    assert!(stdout.contains("Procedure:"), "stdout: {stdout}");
}

#[test]
fn test_invalid_speed() {
    let output = run(&["-p", "/dev/ttyUSB0", "-o", "/dev/ttyUSB1", "-s", "fast"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unopenable_station_port() {
    let output = run(&[
        "-p",
        "/dev/ticket-relay-no-such-station",
        "-o",
        "/dev/ticket-relay-no-such-printer",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = stderr(&output);
    assert!(
        stderr.contains("cannot connect to serial port /dev/ticket-relay-no-such-station"),
        "stderr: {stderr}"
    );
    assert!(!stderr.contains("--help"), "not a usage error: {stderr}");
}

#[test]
fn test_logs_are_plain_when_piped() {
    let output = run_logging(
        &[
            "-p",
            "/dev/ticket-relay-no-such-station",
            "-o",
            "/dev/ticket-relay-no-such-printer",
        ],
        "info",
    );
    assert_eq!(output.status.code(), Some(2));
    let stderr = stderr(&output);
    assert!(
        stderr.contains("Opening OTIMCON port /dev/ticket-relay-no-such-station"),
        "stderr: {stderr}"
    );
    assert!(!stderr.contains('\x1b'), "stderr: {stderr:?}");
}
