//! Available `:` commands and autocomplete logic.

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Usage hint for commands taking an argument, e.g. "open <slug>"
  pub usage: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "links",
    aliases: &["l", "list", "home"],
    description: "Manage short links",
    usage: "links",
  },
  Command {
    name: "open",
    aliases: &["o", "goto"],
    description: "Follow a short link to its destination",
    usage: "open <slug>",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit l9s",
    usage: "quit",
  },
];

/// A parsed command line: the command word plus everything after it.
pub fn split_input(input: &str) -> (&str, &str) {
  let input = input.trim();
  match input.split_once(char::is_whitespace) {
    Some((word, rest)) => (word, rest.trim()),
    None => (input, ""),
  }
}

/// Get autocomplete suggestions for the command word of `input`.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let (word, _args) = split_input(input);
  let word = word.to_lowercase();

  if word.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == word {
      matches.push((cmd, 0));
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&word.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&word) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&word)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&word) {
      matches.push((cmd, 4));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("links");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "links");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("o");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "open");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("li");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "links");
  }

  #[test]
  fn test_argument_does_not_break_matching() {
    let suggestions = get_suggestions("open my-slug");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "open");
  }

  #[test]
  fn test_split_input() {
    assert_eq!(split_input("open abc"), ("open", "abc"));
    assert_eq!(split_input("  open   abc  "), ("open", "abc"));
    assert_eq!(split_input("quit"), ("quit", ""));
    assert_eq!(split_input(""), ("", ""));
  }
}
