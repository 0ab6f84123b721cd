//! Turn interactive plot display calls into image saves.

use std::path::Path;

pub const SHOW_CALL: &str = ".show()";

/// Replace every `.show()` with `.savefig("<image>")`.
pub fn replace_show_with_savefig(code: &str, image: &Path) -> String {
    if !code.contains(SHOW_CALL) {
        return code.to_string();
    }
    let save = format!(".savefig(\"{}\")", image.display());
    code.replace(SHOW_CALL, &save)
}
