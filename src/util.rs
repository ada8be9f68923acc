//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// Single pass over the template: substituted values are emitted verbatim and never
/// rescanned, so a value containing `{other_key}` stays as written. Unknown
/// placeholders are left untouched.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let value = after
      .find('}')
      .and_then(|close| pairs.iter().find(|(k, _)| *k == &after[..close]).map(|(_, v)| (close, *v)));
    match value {
      Some((close, v)) => {
        out.push_str(v);
        rest = &after[close + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

/// First `max_chars` characters of `s`, with "..." appended when something was cut.
/// Counts chars, not bytes, so Hangul and other multi-byte text is never split.
pub fn preview(s: &str, max_chars: usize) -> String {
  match s.char_indices().nth(max_chars) {
    Some((cut, _)) => format!("{}...", &s[..cut]),
    None => s.to_string(),
  }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  match s.char_indices().nth(max_chars) {
    Some((cut, _)) => format!("{}… ({} bytes total)", &s[..cut], s.len()),
    None => s.to_string(),
  }
}
