use anyhow::{Context, Result};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
}

impl ExecResult {
    /// True when the process exited 0 before the deadline.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Run a command and return the result regardless of exit code.
///
/// The child is killed once `timeout` elapses; the result then carries
/// `timed_out = true` and whatever exit code the kill produced.
pub fn run_cmd_unchecked(cmd: &str, args: &[&str], timeout: Duration) -> Result<ExecResult> {
    let start = Instant::now();
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to execute {cmd}"))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("failed to wait for {cmd}"))?
        {
            break Some(status);
        }
        if start.elapsed() >= timeout {
            tracing::warn!("{} {} timed out after {:?}", cmd, args.join(" "), timeout);
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };
    let duration = start.elapsed();

    let result = match status {
        Some(status) => ExecResult {
            exit_code: status.code().unwrap_or(-1),
            stdout: decode_output(&stdout.join().unwrap_or_default()),
            stderr: decode_output(&stderr.join().unwrap_or_default()),
            duration,
            timed_out: false,
        },
        // Grandchildren may still hold the pipes open, so the readers are
        // abandoned rather than joined.
        None => ExecResult {
            exit_code: -1,
            duration,
            timed_out: true,
            ..ExecResult::default()
        },
    };

    tracing::debug!(
        "{} {} -> exit {} in {:?}",
        cmd,
        args.join(" "),
        result.exit_code,
        result.duration
    );
    if result.exit_code != 0 && !result.stderr.trim().is_empty() {
        tracing::debug!("{cmd} stderr: {}", result.stderr.trim());
    }
    Ok(result)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Decode process output, handling the UTF-16LE that `wsl.exe` writes
/// for its own commands (`--list`, `--version`).
pub fn decode_output(bytes: &[u8]) -> String {
    if looks_like_utf16le(bytes) {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
            .trim_start_matches('\u{feff}')
            .to_string()
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

fn looks_like_utf16le(bytes: &[u8]) -> bool {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return false;
    }
    if bytes.starts_with(&[0xff, 0xfe]) {
        return true;
    }
    let odd_nuls = bytes.iter().skip(1).step_by(2).filter(|b| **b == 0).count();
    odd_nuls * 2 >= bytes.len() / 2
}
