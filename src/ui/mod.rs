pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::{App, Mode};
use ratatui::prelude::*;
use ratatui::widgets::{ListState, Paragraph};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let breadcrumbs = app.view_breadcrumb();
  renderfns::draw_header(frame, chunks[0], app.server_url(), &breadcrumbs);

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }

  draw_status_bar(frame, chunks[2], app);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let line = match app.mode() {
    Mode::Normal => {
      if let Some(status) = app.status() {
        Line::styled(status.to_string(), Style::default().fg(Color::Red))
      } else {
        Line::styled(
          " :command  Ctrl-C:quit",
          Style::default().fg(Color::DarkGray),
        )
      }
    }
    Mode::Command => {
      let mut spans = vec![Span::styled(
        format!(":{}", app.command_input()),
        Style::default().fg(Color::Yellow),
      )];

      let suggestions = app.autocomplete_suggestions();
      if !suggestions.is_empty() {
        spans.push(Span::raw("   "));
        for (i, cmd) in suggestions.iter().enumerate() {
          let style = if i == app.selected_suggestion() {
            Style::default().fg(Color::Cyan).bold()
          } else {
            Style::default().fg(Color::DarkGray)
          };
          spans.push(Span::styled(cmd.usage, style));
          spans.push(Span::raw("  "));
        }
        if let Some(cmd) = suggestions.get(app.selected_suggestion()) {
          spans.push(Span::styled(
            format!("- {}", cmd.description),
            Style::default().fg(Color::DarkGray),
          ));
        }
      }

      Line::from(spans)
    }
  };

  frame.render_widget(Paragraph::new(line), area);
}

/// Keep a list selection inside bounds as the underlying data changes.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ensure_valid_selection() {
    let mut state = ListState::default();

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);

    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(5));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));
  }
}
