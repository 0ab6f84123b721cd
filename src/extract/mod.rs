//! Fenced code block extraction from free-form model responses.

const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Outside,
    Inside,
}

/// Return the body of the first fenced block in `text`.
///
/// The line carrying the opening fence (and its language tag) is dropped and
/// body lines are joined with `\n`, without a trailing newline. A response
/// with no fence, or whose first block never closes, yields an empty string.
pub fn extract_code(text: &str) -> String {
    let mut state = Scan::Outside;
    let mut body: Vec<&str> = Vec::new();

    for line in text.lines() {
        let fenced = line.contains(FENCE);
        match (state, fenced) {
            (Scan::Outside, false) => continue,
            (Scan::Outside, true) => state = Scan::Inside,
            (Scan::Inside, true) => return body.join("\n"),
            (Scan::Inside, false) => body.push(line),
        }
    }

    String::new()
}
