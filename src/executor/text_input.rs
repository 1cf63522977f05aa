// Text encoding for `adb shell input text`.
// The device shell re-parses the argument, so spaces and shell metacharacters
// must be encoded before transmission.

/// Characters the device shell would interpret; each gets a backslash.
const SHELL_META: &[char] = &['&', '<', '>', '|', ';', '$', '`', '(', ')', '\'', '"'];

/// Encode `text` for `input text`: space becomes `%s`, shell metacharacters
/// are backslash-escaped, everything else passes through unchanged.
///
/// Not idempotent: escaping an already escaped string escapes it again.
pub fn escape_text_for_input(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            ' ' => out.push_str("%s"),
            c if SHELL_META.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// `input text` only injects ASCII reliably; anything else is usually dropped.
pub fn has_untypable_chars(text: &str) -> bool {
    text.chars().any(|c| !c.is_ascii() || c.is_ascii_control())
}
