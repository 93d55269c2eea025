//! Logging helpers for quoting story-authored text and script expressions.
//! Keeps every log entry on one line no matter what the content contains.

/// Flatten a content string for single-line logging.
///
/// Newlines, carriage returns, tabs, and backslashes become their two-character
/// escape forms; any other control character is rendered as `\xNN`. Output is
/// capped with an ellipsis so a runaway paragraph cannot flood the log.
pub fn escape_log(s: &str) -> String {
    const PREVIEW_CAP: usize = 240;
    let mut out = String::with_capacity(s.len().min(PREVIEW_CAP) + 4);
    for (seen, ch) in s.chars().enumerate() {
        if seen >= PREVIEW_CAP {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_log;

    #[test]
    fn flattens_control_characters() {
        let s = "A damp cellar.\nStairs lead up.\tMind the \\rail\\.";
        assert_eq!(
            escape_log(s),
            "A damp cellar.\\nStairs lead up.\\tMind the \\\\rail\\\\."
        );
    }

    #[test]
    fn caps_long_content() {
        let s = "x".repeat(500);
        let esc = escape_log(&s);
        assert_eq!(esc.chars().count(), 241);
        assert!(esc.ends_with('…'));
    }
}
