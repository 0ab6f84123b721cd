//! Python interpreter invocation.

use std::{
    path::Path,
    process::{Command, ExitStatus, Stdio},
};

use anyhow::{Context, Result};

/// Marks the line carrying the JSON record of the exception that ended a run.
pub const ERROR_SENTINEL: &str = "__CELLEXEC_ERROR__";

/// Runs the script given as `argv[1]` as `__main__`. When it ends by an
/// uncaught exception, or a non-zero `SystemExit`, one JSON record for that
/// exception is written to stderr after [`ERROR_SENTINEL`].
const BOOTSTRAP: &str = r#"import json, os, runpy, sys, traceback

def report(err):
    script = os.path.abspath(sys.argv[0])
    frames = traceback.extract_tb(err.__traceback__)
    if isinstance(err, SyntaxError):
        line = err.lineno
    else:
        own = [f for f in frames if os.path.abspath(f.filename) == script]
        pick = own[0] if own else (frames[-1] if frames else None)
        line = pick.lineno if pick else None
    message = str(err.args[0]) if err.args else ""
    record = {"kind": type(err).__name__, "line": line, "message": message}
    sys.stderr.write("\n__CELLEXEC_ERROR__" + json.dumps(record) + "\n")
    sys.stderr.flush()

sys.argv = sys.argv[1:]
try:
    runpy.run_path(sys.argv[0], run_name="__main__")
except SystemExit as err:
    if err.code not in (0, None):
        report(err)
    raise
except BaseException as err:
    traceback.print_exc()
    report(err)
    sys.exit(1)
"#;

/// Captured streams and status of one interpreter run.
#[derive(Debug)]
pub struct RunOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct Interpreter {
    program: String,
}

impl Interpreter {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Run `script` to completion and capture both streams.
    pub fn run(&self, script: &Path) -> Result<RunOutput> {
        let out = Command::new(&self.program)
            .arg("-u") // unbuffered
            .arg("-c")
            .arg(BOOTSTRAP)
            .arg(script)
            .env("MPLBACKEND", "Agg")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| {
                format!(
                    "failed to run {} with interpreter {}",
                    script.display(),
                    self.program
                )
            })?;

        Ok(RunOutput {
            status: out.status,
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }

    /// Whether the interpreter can be started at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}
