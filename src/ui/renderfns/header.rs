use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, server, and breadcrumb trail
pub fn draw_header(frame: &mut Frame, area: Rect, server_url: &str, breadcrumbs: &[String]) {
  let domain = extract_domain(server_url);

  let mut spans = vec![
    Span::styled(" l9s ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", domain), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
  ];

  for (i, crumb) in breadcrumbs.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    } else {
      spans.push(Span::raw(" "));
    }
    let style = if i + 1 == breadcrumbs.len() {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };
    spans.push(Span::styled(crumb.clone(), style));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Extract domain from the server URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_domain() {
    assert_eq!(extract_domain("https://sho.rt"), "sho.rt");
    assert_eq!(extract_domain("https://s.example.com/api"), "s.example.com");
    assert_eq!(extract_domain("http://localhost:3333"), "localhost:3333");
  }
}
