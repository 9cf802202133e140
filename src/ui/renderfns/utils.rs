/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.len() <= max_len {
    s.to_string()
  } else {
    format!("{}...", &s[..max_len.saturating_sub(3)])
  }
}

/// Scheme-less display form of a short link, e.g. "sho.rt/abc"
pub fn short_display(base_url: &str, slug: &str) -> String {
  let host = base_url
    .strip_prefix("https://")
    .or_else(|| base_url.strip_prefix("http://"))
    .unwrap_or(base_url)
    .trim_end_matches('/');
  format!("{}/{}", host, slug)
}
