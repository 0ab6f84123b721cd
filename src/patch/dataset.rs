//! Point the first dataset reference in a snippet at the local copy.

use std::path::Path;

/// Rewrite the quoted dataset path on the first line that mentions `extension`.
///
/// The quote character is `'` when the line contains one, `"` otherwise, and the
/// old path is everything between its first and last occurrence on the line.
/// Lines whose quotes enclose nothing are passed over. Once a path is found,
/// every verbatim occurrence of it anywhere in `code` becomes `local`.
pub fn rewrite_dataset_path(code: &str, extension: &str, local: &Path) -> String {
    let local = local.to_string_lossy();

    for line in code.lines().filter(|l| l.contains(extension)) {
        let quote = if line.contains('\'') { '\'' } else { '"' };
        let (Some(start), Some(end)) = (line.find(quote), line.rfind(quote)) else {
            continue;
        };
        if end <= start + 1 {
            continue;
        }
        let old = &line[start + 1..end];
        return code.replace(old, &local);
    }

    code.to_string()
}
