//! Shared test infrastructure: stub tracers/subjects and harness invocation.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path to the compiled grading binary.
pub fn grader_bin() -> &'static str {
    env!("CARGO_BIN_EXE_tracegrade")
}

/// Write an executable shell script into `dir` and return its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write stub script");
    let mut perms = std::fs::metadata(&path)
        .expect("stat stub script")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod stub script");
    path
}

/// Run the grader with `args` and return its raw output.
pub fn run_grader(args: &[&str]) -> Output {
    Command::new(grader_bin())
        .args(args)
        .output()
        .expect("run grader")
}

pub fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
