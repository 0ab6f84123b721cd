//! Execution engine: runs a script out of process and classifies how it ended.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::artifacts::ArtifactStore;

pub mod python;
pub mod traceback;

pub use python::Interpreter;
pub use traceback::{classify, from_record, Classification};

/// Terminal state of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded {
        output: String,
        /// Anything written to stderr by a run that still exited cleanly.
        diagnostics: String,
    },
    Failed(Classification),
}

impl ExecutionOutcome {
    /// Captured stdout on success, the error description on failure.
    pub fn text(&self) -> String {
        match self {
            Self::Succeeded { output, .. } => output.clone(),
            Self::Failed(c) => c.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Executor {
    interpreter: Interpreter,
    store: ArtifactStore,
}

impl Executor {
    pub fn new(interpreter: Interpreter, store: ArtifactStore) -> Self {
        Self { interpreter, store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run code that has no script file yet, through a temporary one.
    pub fn execute(&self, code: &str, id: &str, save_output: bool) -> Result<ExecutionOutcome> {
        let mut tmp = tempfile::Builder::new()
            .prefix("cellexec-")
            .suffix(".py")
            .tempfile()
            .context("creating temporary script")?;
        tmp.write_all(code.as_bytes())
            .and_then(|_| tmp.flush())
            .context("writing temporary script")?;
        self.run_script(tmp.path(), id, save_output)
    }

    /// Run a persisted script. With `save_output`, stale results for `id` are
    /// removed first and exactly one new result is written afterwards (output
    /// only when non-empty).
    pub fn run_script(&self, script: &Path, id: &str, save_output: bool) -> Result<ExecutionOutcome> {
        if save_output {
            self.store.clear_results(id)?;
        }

        let script = absolute(script);
        let run = self.interpreter.run(&script)?;

        let outcome = if run.status.success() {
            ExecutionOutcome::Succeeded { output: run.stdout, diagnostics: run.stderr }
        } else {
            let classification = from_record(&run.stderr)
                .or_else(|| classify(&run.stderr, &script))
                .unwrap_or_else(|| Classification {
                    kind: "SystemExit".into(),
                    line: None,
                    message: match run.status.code() {
                        Some(code) => format!("exit status {}", code),
                        None => "terminated by signal".into(),
                    },
                });
            ExecutionOutcome::Failed(classification)
        };

        if save_output {
            match &outcome {
                ExecutionOutcome::Succeeded { output, .. } if !output.is_empty() => {
                    self.store.write_output(id, output)?;
                }
                ExecutionOutcome::Failed(c) => {
                    self.store.write_error(id, &c.to_string())?;
                }
                _ => {}
            }
        }

        Ok(outcome)
    }
}

fn absolute(p: &Path) -> PathBuf {
    p.canonicalize().unwrap_or_else(|_| p.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn executor(root: &Path) -> Option<Executor> {
        let interpreter = Interpreter::new("python3");
        if !interpreter.is_available() {
            println!("python3 not available, skipping");
            return None;
        }
        for d in ["scripts", "images", "outputs", "errors"] {
            fs::create_dir_all(root.join(d)).unwrap();
        }
        let store = ArtifactStore::new(
            root.join("scripts"),
            root.join("images"),
            root.join("outputs"),
            root.join("errors"),
        );
        Some(Executor::new(interpreter, store))
    }

    #[test]
    fn captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let outcome = ex.execute("print(1+1)", "sum", true).unwrap();
        assert_eq!(outcome.text(), "2\n");
        assert!(matches!(outcome, ExecutionOutcome::Succeeded { .. }));
        assert_eq!(fs::read_to_string(ex.store().output_path("sum")).unwrap(), "2\n");
        assert!(!ex.store().error_path("sum").exists());
    }

    #[test]
    fn division_by_zero_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let outcome = ex.execute("x = 1\nprint(x)\ny = x/0\n", "div", true).unwrap();
        assert_eq!(outcome.text(), "ZeroDivisionError at line 3: division by zero");
        assert!(!ex.store().output_path("div").exists());
        assert_eq!(
            fs::read_to_string(ex.store().error_path("div")).unwrap(),
            "ZeroDivisionError at line 3: division by zero"
        );
    }

    #[test]
    fn missing_colon_is_a_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let outcome = ex.execute("x = 1\nif True\n    pass\n", "syn", false).unwrap();
        match outcome {
            ExecutionOutcome::Failed(c) => {
                assert_eq!(c.kind, "SyntaxError");
                assert_eq!(c.line, Some(2));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!ex.store().error_path("syn").exists());
    }

    #[test]
    fn error_raised_in_function_reports_module_line() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let code = "def f():\n    return undefined_name\n\nf()\n";
        let outcome = ex.execute(code, "nested", false).unwrap();
        assert_eq!(outcome.text(), "NameError at line 4: name 'undefined_name' is not defined");
    }

    #[test]
    fn empty_output_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let outcome = ex.execute("x = 1", "quiet", true).unwrap();
        assert_eq!(outcome.text(), "");
        assert!(!ex.store().output_path("quiet").exists());
        assert!(!ex.store().error_path("quiet").exists());
    }

    #[test]
    fn success_replaces_a_stale_error() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        ex.store().write_error("again", "NameError at line 1: old").unwrap();
        ex.execute("print('ok')", "again", true).unwrap();
        assert!(!ex.store().error_path("again").exists());
        assert_eq!(fs::read_to_string(ex.store().output_path("again")).unwrap(), "ok\n");
    }

    #[test]
    fn bare_nonzero_exit_is_system_exit() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let outcome = ex.execute("import sys\nsys.exit(3)", "bye", false).unwrap();
        assert_eq!(outcome.text(), "SystemExit at line 2: 3");
    }

    #[test]
    fn shutdown_error_in_del_does_not_mask_the_real_failure() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let code = "class C:\n    def __del__(self):\n        1/0\nc = C()\nraise ValueError('real')";
        let outcome = ex.execute(code, "del", false).unwrap();
        assert_eq!(outcome.text(), "ValueError at line 5: real");
    }

    #[test]
    fn printed_traceback_then_exit_is_system_exit() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let code = "import sys, traceback\ntry:\n    1/0\nexcept ZeroDivisionError:\n    traceback.print_exc()\nsys.exit(1)";
        let outcome = ex.execute(code, "printed", false).unwrap();
        assert_eq!(outcome.text(), "SystemExit at line 6: 1");
    }

    #[test]
    fn message_is_the_first_exception_argument() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let outcome = ex.execute("d = {}\nd['k']", "key", false).unwrap();
        assert_eq!(outcome.text(), "KeyError at line 2: k");
        let outcome = ex.execute("x = 0\nraise ValueError('a', 'b')", "tuple", false).unwrap();
        assert_eq!(outcome.text(), "ValueError at line 2: a");
        let outcome = ex.execute("open('/definitely/not/here.csv')", "nofile", false).unwrap();
        assert_eq!(outcome.text(), "FileNotFoundError at line 1: 2");
    }

    #[test]
    fn script_sees_itself_as_main() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let outcome = ex.execute("if __name__ == '__main__':\n    print('main')", "main", false).unwrap();
        assert_eq!(outcome.text(), "main\n");
    }

    #[test]
    fn partial_output_is_dropped_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let outcome = ex.execute("print('before')\nraise ValueError('boom')", "partial", true).unwrap();
        assert_eq!(outcome.text(), "ValueError at line 2: boom");
        assert!(!ex.store().output_path("partial").exists());
    }

    #[test]
    fn hard_exit_without_record_falls_back_to_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let Some(ex) = executor(dir.path()) else { return };
        let outcome = ex.execute("import os\nos._exit(4)", "hard", false).unwrap();
        assert_eq!(outcome.text(), "SystemExit at line ?: exit status 4");
    }

    #[test]
    fn missing_interpreter_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), dir.path(), dir.path(), dir.path());
        let ex = Executor::new(Interpreter::new("definitely-not-a-python-binary"), store);
        assert!(ex.execute("print(1)", "x", false).is_err());
    }
}
