//! Control-character sanitize pass over incoming narrative text.
//!
//! One range-based pass instead of per-character substitutions: C0 control
//! characters are stripped except tab and newline, and carriage returns
//! (alone or in `\r\n` pairs) fold to `\n`. This is the crate's single
//! control-character policy; the backend has been observed emitting the
//! whole C0 range inside token content.

pub fn scrub(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            '\t' | '\n' => out.push(ch),
            '\u{0000}'..='\u{001F}' => {}
            _ => out.push(ch),
        }
    }
    out
}
