//! Form fields for the create-link form, with field-level validation.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use url::Url;

/// Result of handling a key event in a form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldResult {
  /// Key was handled by the field
  Consumed,
  /// Enter pressed - the form should submit
  Submitted,
  /// Escape pressed - the form should close
  Cancelled,
  /// Key not handled, pass to the form (Tab, arrows between fields)
  NotHandled,
}

/// A labeled single-line input with its own error state.
#[derive(Debug, Clone)]
pub struct FormField {
  label: &'static str,
  buffer: String,
  cursor: usize,
  error: Option<String>,
}

impl FormField {
  pub fn new(label: &'static str) -> Self {
    Self {
      label,
      buffer: String::new(),
      cursor: 0,
      error: None,
    }
  }

  pub fn value(&self) -> &str {
    &self.buffer
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn set_error(&mut self, message: impl Into<String>) {
    self.error = Some(message.into());
  }

  pub fn clear_error(&mut self) {
    self.error = None;
  }

  /// Reset the field completely (value and error).
  pub fn reset(&mut self) {
    self.buffer.clear();
    self.cursor = 0;
    self.error = None;
  }

  /// Handle a key event. Editing a field clears its error - stale
  /// validation messages under a corrected value only mislead.
  pub fn handle_key(&mut self, key: KeyEvent) -> FieldResult {
    match key.code {
      KeyCode::Esc => FieldResult::Cancelled,
      KeyCode::Enter => FieldResult::Submitted,
      KeyCode::Backspace => {
        if let Some(c) = self.buffer[..self.cursor].chars().next_back() {
          self.cursor -= c.len_utf8();
          self.buffer.remove(self.cursor);
          self.error = None;
        }
        FieldResult::Consumed
      }
      KeyCode::Delete => {
        if self.cursor < self.buffer.len() {
          self.buffer.remove(self.cursor);
          self.error = None;
        }
        FieldResult::Consumed
      }
      KeyCode::Left => {
        if let Some(c) = self.buffer[..self.cursor].chars().next_back() {
          self.cursor -= c.len_utf8();
        }
        FieldResult::Consumed
      }
      KeyCode::Right => {
        if let Some(c) = self.buffer[self.cursor..].chars().next() {
          self.cursor += c.len_utf8();
        }
        FieldResult::Consumed
      }
      KeyCode::Home => {
        self.cursor = 0;
        FieldResult::Consumed
      }
      KeyCode::End => {
        self.cursor = self.buffer.len();
        FieldResult::Consumed
      }
      KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.buffer = self.buffer[self.cursor..].to_string();
        self.cursor = 0;
        self.error = None;
        FieldResult::Consumed
      }
      KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.buffer.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.error = None;
        FieldResult::Consumed
      }
      _ => FieldResult::NotHandled,
    }
  }

  /// Render the field: a bordered input line plus an error line below.
  /// `area` should be 4 rows tall.
  pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(3), Constraint::Length(1)])
      .split(area);

    let border_color = if self.error.is_some() {
      Color::Red
    } else if focused {
      Color::Yellow
    } else {
      Color::DarkGray
    };

    let block = Block::default()
      .title(format!(" {} ", self.label))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border_color));

    let input_line = if focused {
      Line::from(vec![
        Span::raw(&self.buffer[..self.cursor]),
        Span::styled("█", Style::default().fg(Color::Yellow)),
        Span::raw(&self.buffer[self.cursor..]),
      ])
    } else {
      Line::from(self.buffer.as_str())
    };

    frame.render_widget(Paragraph::new(input_line).block(block), chunks[0]);

    if let Some(error) = &self.error {
      let error_line = Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red));
      frame.render_widget(error_line, chunks[1]);
    }
  }
}

/// Validate the destination URL: must parse and be http(s).
pub fn validate_original_url(value: &str) -> Result<(), String> {
  let parsed = Url::parse(value).map_err(|_| "Enter a valid URL".to_string())?;
  if !matches!(parsed.scheme(), "http" | "https") {
    return Err("Only http and https URLs can be shortened".to_string());
  }
  Ok(())
}

/// Validate the slug: non-empty, letters/digits/hyphens/underscores only.
pub fn validate_slug(value: &str) -> Result<(), String> {
  if value.is_empty() {
    return Err("A short link is required".to_string());
  }
  if !value
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
  {
    return Err("Only letters, numbers, hyphens and underscores are allowed".to_string());
  }
  Ok(())
}
