//! Small utility helpers used across modules.

/// Derive a deterministic, file-safe storage key from a profile identity.
/// ASCII alphanumerics and `-` pass through; every other char (spaces,
/// Cyrillic captions, punctuation, `_` itself) becomes `_<hex codepoint>`
/// so distinct names can never collide on disk.
pub fn storage_key(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  for ch in name.chars() {
    if ch.is_ascii_alphanumeric() || ch == '-' {
      out.push(ch);
    } else {
      out.push_str(&format!("_{:x}", ch as u32));
    }
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    s.to_string()
  } else {
    let cut = s
      .char_indices()
      .take_while(|(i, _)| *i <= max)
      .last()
      .map(|(i, _)| i)
      .unwrap_or(0);
    format!("{}… ({} bytes total)", &s[..cut], s.len())
  }
}
