//! Classify a Python failure from the interpreter's stderr.

use std::{fmt, path::Path, sync::OnceLock};

use regex::Regex;
use serde::Deserialize;

use super::python::ERROR_SENTINEL;

const TRACEBACK_HEADER: &str = "Traceback (most recent call last):";
const SYNTAX_KINDS: &[&str] = &["SyntaxError", "IndentationError", "TabError"];

/// Kind, line and message of the error that ended a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Classification {
    pub kind: String,
    pub line: Option<u32>,
    pub message: String,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(n) => write!(f, "{} at line {}: {}", self.kind, n, self.message),
            None => write!(f, "{} at line ?: {}", self.kind, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame<'a> {
    file: &'a str,
    line: u32,
}

fn frame_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*File "(?P<file>[^"]+)", line (?P<line>\d+)"#).unwrap())
}

fn exception_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<kind>[A-Za-z_][A-Za-z0-9_.]*)(?::\s?(?P<message>.*))?$").unwrap()
    })
}

/// The record the bootstrap wrote for the exception that ended the run.
///
/// Only a line starting with the sentinel counts, and the last one wins, so
/// tracebacks the script printed itself or `__del__` errors reported during
/// shutdown never displace it.
pub fn from_record(stderr: &str) -> Option<Classification> {
    stderr
        .lines()
        .rev()
        .filter_map(|l| l.strip_prefix(ERROR_SENTINEL))
        .find_map(|json| serde_json::from_str(json.trim_end()).ok())
}

/// Parse the final exception reported in `stderr` for a run of `script`.
/// Used when no bootstrap record is present.
///
/// Only the last traceback block counts, so for chained exceptions the one
/// that escaped is reported. Syntax-level kinds take the parser's location;
/// anything else takes the outermost frame inside `script`, falling back to
/// the deepest frame when the script never appears. Returns `None` when
/// stderr holds no traceback at all.
pub fn classify(stderr: &str, script: &Path) -> Option<Classification> {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines
        .iter()
        .rposition(|l| l.trim_end() == TRACEBACK_HEADER)
        .unwrap_or(0);
    let block = &lines[start..];
    let has_header = block.first().is_some_and(|l| l.trim_end() == TRACEBACK_HEADER);

    let mut frames = Vec::new();
    let mut last_frame_at = None;
    for (i, line) in block.iter().enumerate() {
        if let Some(caps) = frame_re().captures(line) {
            if let (Some(file), Ok(n)) = (caps.name("file"), caps["line"].parse::<u32>()) {
                frames.push(Frame { file: file.as_str(), line: n });
                last_frame_at = Some(i);
            }
        }
    }
    if frames.is_empty() && !has_header {
        return None;
    }

    let after = last_frame_at.map_or(1, |i| i + 1);
    let caps = block
        .iter()
        .skip(after)
        .filter(|l| !l.starts_with(char::is_whitespace))
        .find_map(|l| exception_re().captures(l.trim_end()))?;

    let qualified = &caps["kind"];
    let kind = qualified.rsplit('.').next().unwrap_or(qualified).to_string();
    let message = caps
        .name("message")
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let line = if SYNTAX_KINDS.contains(&kind.as_str()) {
        frames.last().map(|f| f.line)
    } else {
        frames
            .iter()
            .find(|f| same_script(f.file, script))
            .or(frames.last())
            .map(|f| f.line)
    };

    Some(Classification { kind, line, message })
}

fn same_script(reported: &str, script: &Path) -> bool {
    let reported = Path::new(reported);
    reported == script || (reported.file_name().is_some() && reported.file_name() == script.file_name())
}
