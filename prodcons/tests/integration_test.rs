use eyre::{Context, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use rstest::{fixture, rstest};
use serde_json::Value;
use serial_test::serial;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct TestSetup {
    _temp_dir: TempDir,
    config_path: PathBuf,
}

impl TestSetup {
    fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("prodcons.toml");

        Ok(TestSetup {
            _temp_dir: temp_dir,
            config_path,
        })
    }
}

#[fixture]
fn setup() -> TestSetup {
    TestSetup::new().expect("failed to create test setup")
}

fn prodcons() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_prodcons"));
    command.env("RUST_LOG", "info");
    command
}

fn run(args: &[&str]) -> Result<Output> {
    prodcons()
        .args(args)
        .output()
        .wrap_err("failed to run prodcons")
}

/// Child process that is killed if the test gives up on it.
struct ManagedProcess {
    child: Option<Child>,
}

impl ManagedProcess {
    fn spawn(mut command: Command) -> Result<Self> {
        let child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .wrap_err("failed to spawn prodcons")?;
        Ok(ManagedProcess { child: Some(child) })
    }

    fn child(&mut self) -> &mut Child {
        self.child.as_mut().expect("process already reaped")
    }

    fn interrupt(&mut self) -> Result<()> {
        kill(Pid::from_raw(self.child().id() as i32), Signal::SIGINT)?;
        Ok(())
    }

    fn wait_timeout(&mut self, timeout: Duration) -> Result<std::process::ExitStatus> {
        let start = Instant::now();
        loop {
            if let Some(status) = self.child().try_wait()? {
                self.child = None;
                return Ok(status);
            }
            if start.elapsed() > timeout {
                eyre::bail!("prodcons did not exit within {:?}", timeout);
            }
            thread::sleep(Duration::from_millis(50));
        }
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn parse_events(stdout: &[u8]) -> Result<Vec<Value>> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).wrap_err_with(|| format!("bad line {line}")))
        .collect()
}

fn values_of(events: &[Value], kind: &str) -> Vec<u64> {
    events
        .iter()
        .filter(|event| event["event"] == kind)
        .filter_map(|event| event["value"].as_u64())
        .collect()
}

fn count_of(events: &[Value], kind: &str) -> usize {
    events.iter().filter(|event| event["event"] == kind).count()
}

/// Every produced value is consumed exactly once and the run ends with an
/// empty buffer.
fn assert_clean_run(events: &[Value], consumers: usize) {
    let produced = values_of(events, "produced");
    let mut consumed = values_of(events, "consumed");
    consumed.sort_unstable();

    assert_eq!(produced, (1..=produced.len() as u64).collect::<Vec<_>>());
    assert_eq!(consumed, produced);
    assert_eq!(count_of(events, "shutdown_initiated"), 1);
    assert_eq!(count_of(events, "producer_stopped"), 1);
    assert_eq!(count_of(events, "consumer_stopped"), consumers);

    let summary = events.last().expect("no events");
    assert_eq!(summary["event"], "final_summary");
    assert_eq!(summary["produced"], produced.len() as u64);
    assert_eq!(summary["consumed"], produced.len() as u64);
    assert_eq!(summary["remaining"], 0);
}

#[rstest]
#[case::single_slot(1, 1)]
#[case::several_consumers(3, 4)]
#[serial]
fn test_duration_run(#[case] consumers: usize, #[case] capacity: usize) -> Result<()> {
    let consumers_arg = consumers.to_string();
    let capacity_arg = capacity.to_string();
    let output = run(&[
        consumers_arg.as_str(),
        capacity_arg.as_str(),
        "0",
        "--duration",
        "300ms",
        "--work-delay",
        "2ms",
        "--format",
        "json",
    ])?;

    assert!(output.status.success(), "exit status {}", output.status);
    let events = parse_events(&output.stdout)?;
    assert_clean_run(&events, consumers);

    for event in events.iter().filter(|e| e["event"] == "produced") {
        assert!(event["count"].as_u64().unwrap() <= capacity as u64);
    }

    Ok(())
}

#[rstest]
#[serial]
fn test_sigint_drains_and_exits() -> Result<()> {
    let mut command = prodcons();
    command.args(["3", "8", "0", "--work-delay", "5ms", "--format", "json"]);
    let mut process = ManagedProcess::spawn(command)?;

    let stdout = process.child().stdout.take().expect("stdout is piped");
    let (lines_tx, lines_rx) = mpsc::channel();
    let reader = thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(|line| line.ok()) {
            if lines_tx.send(line).is_err() {
                break;
            }
        }
    });

    let first = lines_rx
        .recv_timeout(Duration::from_secs(10))
        .wrap_err("no output before interrupt")?;
    thread::sleep(Duration::from_millis(200));
    process.interrupt()?;

    let status = process.wait_timeout(Duration::from_secs(10))?;
    assert!(status.success(), "exit status {status}");
    reader.join().expect("reader thread panicked");

    let mut output = first.into_bytes();
    for line in lines_rx.try_iter() {
        output.push(b'\n');
        output.extend_from_slice(line.as_bytes());
    }
    let events = parse_events(&output)?;
    assert_clean_run(&events, 3);

    Ok(())
}

#[rstest]
#[case::zero_consumers(&["0", "4", "0"], "consumer count")]
#[case::zero_capacity(&["2", "0", "0"], "buffer capacity")]
#[serial]
fn test_invalid_arguments(#[case] args: &[&str], #[case] expected: &str) -> Result<()> {
    let output = run(args)?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(expected), "stderr: {stderr}");

    Ok(())
}

#[rstest]
#[serial]
fn test_config_file(setup: TestSetup) -> Result<()> {
    fs::write(
        &setup.config_path,
        r#"
[buffer]
capacity = 2

[producer]
interval_secs = 0

[consumer]
count = 1
work_delay_ms = 1

[shutdown]
watch_tick_ms = 10
"#,
    )?;

    let config_arg = setup.config_path.display().to_string();
    let output = run(&["--config", config_arg.as_str(), "--duration", "200ms"])?;

    assert!(output.status.success(), "exit status {}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[producer] +1 (count="));
    assert!(stdout.contains("  [consumer 1] -1 (count="));
    assert!(!stdout.contains("[consumer 2]"));
    assert!(stdout.contains("=== summary ==="));
    assert!(stdout.trim_end().ends_with("remaining: 0"));

    Ok(())
}

#[rstest]
#[serial]
fn test_missing_config_file(setup: TestSetup) -> Result<()> {
    let config_arg = setup.config_path.display().to_string();
    let output = run(&["--config", config_arg.as_str()])?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read config"), "stderr: {stderr}");

    Ok(())
}

#[rstest]
#[serial]
fn test_long_version_names_revision() -> Result<()> {
    let output = run(&["--version"])?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "stdout: {stdout}");
    assert!(stdout.contains("(commit: "), "stdout: {stdout}");

    Ok(())
}
