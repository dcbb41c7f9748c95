//! End-to-end tests for the tracking daemon and the commands reading its data.
//!
//! Tests the full pipeline: events on stdin -> `dwell run` -> database -> `dwell status`.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

fn dwell_binary() -> &'static str {
    env!("CARGO_BIN_EXE_dwell")
}

/// Writes a config file pointing at a database inside `temp`.
fn write_config(temp: &Path) -> std::path::PathBuf {
    let config_path = temp.join("config.toml");
    let db_path = temp.join("data").join("dwell.db");
    std::fs::write(
        &config_path,
        format!("database_path = \"{}\"\n", db_path.display()),
    )
    .unwrap();
    config_path
}

fn dwell(temp: &Path, config: &Path) -> Command {
    let mut command = Command::new(dwell_binary());
    command
        .env("HOME", temp)
        .env("XDG_CONFIG_HOME", temp.join("xdg-config"))
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    command
}

fn stored_totals(temp: &Path, config: &Path) -> serde_json::Value {
    let output = dwell(temp, config)
        .args(["status", "--json"])
        .output()
        .expect("failed to run dwell status");
    assert!(
        output.status.success(),
        "status failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn domain_total(totals: &serde_json::Value, domain: &str) -> i64 {
    totals
        .as_object()
        .unwrap()
        .values()
        .filter_map(|domains| domains.get(domain))
        .map(|ms| ms.as_i64().unwrap())
        .sum()
}

/// Tracked time for a site is written when the user switches away and when input closes.
#[test]
fn test_run_tracks_time_per_domain() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let mut child = dwell(temp.path(), &config)
        .env("RUST_LOG", "info")
        .arg("run")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn dwell run");

    // Wait until the daemon is reading events so the timings below are real.
    let mut stderr = BufReader::new(child.stderr.take().unwrap());
    let mut line = String::new();
    loop {
        line.clear();
        let read = stderr.read_line(&mut line).unwrap();
        assert!(read > 0, "daemon exited before becoming ready");
        if line.contains("waiting for events") {
            break;
        }
    }
    let drain = thread::spawn(move || {
        let mut rest = String::new();
        let _ = std::io::Read::read_to_string(&mut stderr, &mut rest);
        rest
    });

    {
        let stdin = child.stdin.as_mut().unwrap();
        writeln!(
            stdin,
            r#"{{"type":"domain_observed","url":"https://www.example.com/path?x=1","tab":"1","window":"1"}}"#
        )
        .unwrap();
        stdin.flush().unwrap();
        thread::sleep(Duration::from_millis(300));

        // Same domain in another tab: no flush, accrual continues.
        writeln!(
            stdin,
            r#"{{"type":"domain_observed","url":"https://example.com/other","tab":"2","window":"1"}}"#
        )
        .unwrap();
        writeln!(stdin, "this is not json").unwrap();
        stdin.flush().unwrap();
        thread::sleep(Duration::from_millis(200));

        writeln!(
            stdin,
            r#"{{"type":"domain_observed","url":"https://other.com/","tab":"3","window":"1"}}"#
        )
        .unwrap();
        stdin.flush().unwrap();
        thread::sleep(Duration::from_millis(100));
    }
    drop(child.stdin.take());

    let status = child.wait().unwrap();
    let log = drain.join().unwrap();
    assert!(status.success(), "dwell run failed: {log}");
    assert!(log.contains("skipping malformed event"), "log: {log}");

    let totals = stored_totals(temp.path(), &config);
    assert!(domain_total(&totals, "example.com") >= 300, "totals: {totals}");
    assert_eq!(domain_total(&totals, "www.example.com"), 0);

    let output = dwell(temp.path(), &config)
        .arg("status")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("example.com"), "status output: {stdout}");
}

/// Clearing requires confirmation and then empties the store.
#[test]
fn test_clear_requires_yes() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let mut child = dwell(temp.path(), &config)
        .arg("run")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    {
        let stdin = child.stdin.as_mut().unwrap();
        writeln!(stdin, r#"{{"type":"domain_observed","url":"https://a.com/"}}"#).unwrap();
        stdin.flush().unwrap();
        thread::sleep(Duration::from_millis(200));
    }
    drop(child.stdin.take());
    assert!(child.wait().unwrap().success());

    let refused = dwell(temp.path(), &config).arg("clear").output().unwrap();
    assert!(!refused.status.success());
    assert!(String::from_utf8_lossy(&refused.stderr).contains("--yes"));

    let cleared = dwell(temp.path(), &config)
        .args(["clear", "--yes"])
        .output()
        .unwrap();
    assert!(cleared.status.success());

    let totals = stored_totals(temp.path(), &config);
    assert_eq!(totals, serde_json::json!({}));
}

/// A zero heartbeat interval is a configuration error.
#[test]
fn test_run_rejects_zero_heartbeat() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());
    let mut contents = std::fs::read_to_string(&config).unwrap();
    contents.push_str("heartbeat_interval_secs = 0\n");
    std::fs::write(&config, contents).unwrap();

    let output = dwell(temp.path(), &config)
        .arg("run")
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("heartbeat_interval_secs"));
}
