//! Subject execution under the tracing facility.
//!
//! One child process per scenario, run to completion with stdout and the
//! trace channel (the child's stderr) captured in full. Timing is a
//! wall-clock delta around the blocking wait; the runner never kills a
//! subject unless an explicit hard deadline was injected.
use crate::scenario::ScenarioSpec;
use crate::util::format_command_line;
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Everything observed from one subject run.
#[derive(Debug, Clone)]
pub struct RunCapture {
    /// Raw bytes from the subject's primary output channel.
    pub stdout: Vec<u8>,
    /// Raw lines from the tracing channel.
    pub trace_lines: Vec<String>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// The injected hard deadline killed the run.
    pub timed_out: bool,
}

/// Launches subjects for one grading session.
pub struct SubjectRunner {
    subject: PathBuf,
    tracer: Vec<String>,
    kill_after: Option<Duration>,
    verbose: bool,
}

impl SubjectRunner {
    pub fn new(
        subject: PathBuf,
        tracer: Vec<String>,
        kill_after: Option<Duration>,
        verbose: bool,
    ) -> SubjectRunner {
        SubjectRunner {
            subject,
            tracer,
            kill_after,
            verbose,
        }
    }

    /// Run one scenario's subject to completion and capture the result.
    ///
    /// The child's exit status is deliberately not captured: only output,
    /// trace, and timing participate in grading.
    pub fn run(&self, spec: &ScenarioSpec) -> Result<RunCapture> {
        let argv = self.assemble_argv(spec);
        debug!(scenario = spec.id, ?argv, "launch subject");
        if self.verbose {
            eprintln!("+ {}", format_command_line(&argv));
        }

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if spec.clear_env {
            cmd.env_clear();
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .with_context(|| format!("launch {}", format_command_line(&argv)))?;

        let stdout_pipe = child.stdout.take().context("subject stdout pipe")?;
        let stderr_pipe = child.stderr.take().context("subject trace pipe")?;
        // Drain both pipes off-thread so a chatty subject cannot fill one
        // pipe while the runner blocks on the other.
        let stdout_thread = thread::spawn(move || read_all(stdout_pipe));
        let stderr_thread = thread::spawn(move || read_lines(stderr_pipe));

        let timed_out = match self.kill_after {
            None => {
                child.wait().context("wait for subject exit")?;
                false
            }
            Some(limit) => wait_with_deadline(&mut child, limit)?,
        };
        let elapsed = start.elapsed();

        let stdout = stdout_thread
            .join()
            .map_err(|_| anyhow::anyhow!("stdout capture thread panicked"))?;
        let trace_lines = stderr_thread
            .join()
            .map_err(|_| anyhow::anyhow!("trace capture thread panicked"))?;
        debug!(
            scenario = spec.id,
            stdout_bytes = stdout.len(),
            trace_lines = trace_lines.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            timed_out,
            "subject run complete"
        );

        Ok(RunCapture {
            stdout,
            trace_lines,
            elapsed,
            timed_out,
        })
    }

    /// Tracer wrapper first (when the scenario's class is traced), then the
    /// subject path, then the scenario arguments.
    fn assemble_argv(&self, spec: &ScenarioSpec) -> Vec<String> {
        let mut argv = Vec::new();
        if let Some(filter) = spec.trace_class.trace_filter() {
            argv.extend(self.tracer.iter().cloned());
            argv.push("-e".to_string());
            argv.push(format!("trace={filter}"));
        }
        argv.push(self.subject.display().to_string());
        argv.extend(spec.args.iter().cloned());
        argv
    }
}

/// Resolve a subject path: bare names go through `PATH`, anything with a
/// path separator is taken as-is (existence surfaces at launch).
pub fn resolve_subject(subject: &Path) -> Result<PathBuf> {
    if subject.components().count() > 1 {
        return Ok(subject.to_path_buf());
    }
    which::which(subject).with_context(|| format!("resolve subject {}", subject.display()))
}

fn read_all(mut pipe: impl Read) -> Vec<u8> {
    let mut buf = Vec::new();
    // A broken pipe mid-run still yields the bytes read so far.
    let _ = pipe.read_to_end(&mut buf);
    buf
}

fn read_lines(pipe: impl Read) -> Vec<String> {
    BufReader::new(pipe)
        .lines()
        .map_while(Result::ok)
        .collect()
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<bool> {
    let deadline = Instant::now() + limit;
    loop {
        if child.try_wait().context("wait for subject exit")?.is_some() {
            return Ok(false);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            child.wait().context("reap killed subject")?;
            return Ok(true);
        }
        thread::sleep(Duration::from_millis(20));
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_subject;
    use std::path::Path;

    #[test]
    fn relative_paths_are_not_resolved_through_path() {
        let resolved = resolve_subject(Path::new("./signals")).expect("keep relative path");
        assert_eq!(resolved, Path::new("./signals"));
    }

    #[test]
    fn missing_bare_name_is_a_launch_error() {
        assert!(resolve_subject(Path::new("tracegrade-no-such-subject")).is_err());
    }
}
