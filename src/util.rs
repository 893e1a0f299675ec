//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Names of all `{identifier}` placeholders in a template, in order of first appearance.
pub fn placeholders(tpl: &str) -> Vec<&str> {
  let mut found: Vec<&str> = Vec::new();
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    let after = &rest[open + 1..];
    match after.find('}') {
      Some(close) => {
        let name = &after[..close];
        let is_ident = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if is_ident && !found.contains(&name) {
          found.push(name);
        }
        rest = &after[close + 1..];
      }
      None => break,
    }
  }
  found
}

/// Whitespace-separated word count, as reported back to the caller.
pub fn count_words(text: &str) -> usize {
  text.split_whitespace().count()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) { cut -= 1; }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
