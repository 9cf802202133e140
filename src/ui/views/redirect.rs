//! Redirect flow: resolve a slug, count down, open the destination.
//!
//! States: resolving -> resolved (countdown -> navigated) or not-found.
//! The countdown is a [`DeferredNavigation`]; popping the view drops it,
//! which cancels the schedule. An unknown slug is terminal - no retry.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::api::ApiClient;
use crate::query::Query;
use crate::redirect::DeferredNavigation;
use crate::ui::view::{View, ViewAction};

/// View that resolves a slug and opens its destination in the browser.
///
/// The query resolves to `Some(url)` for a known slug and `None` for an
/// unknown one; transport failures land in the query's error state. Both
/// outcomes render the terminal not-found screen.
pub struct RedirectView {
  slug: String,
  query: Query<Option<String>>,
  delay: Duration,
  /// Armed once the slug resolves; dropped on teardown or manual open.
  nav: Option<DeferredNavigation>,
  fire_rx: Option<mpsc::UnboundedReceiver<()>>,
  /// Deadline mirror of the schedule, for the countdown display.
  navigate_at: Option<Instant>,
  navigated: bool,
}

impl RedirectView {
  pub fn new(slug: String, client: ApiClient, delay: Duration) -> Self {
    let fetch_slug = slug.clone();
    let mut query = Query::new(move || {
      let client = client.clone();
      let slug = fetch_slug.clone();
      async move {
        match client.resolve_slug(&slug).await {
          Ok(resolved) => Ok(Some(resolved.original_url)),
          Err(e) if e.is_not_found() => Ok(None),
          Err(e) => Err(e.to_string()),
        }
      }
    });

    // An empty slug is not resolvable; leave the query idle and render
    // the not-found state directly.
    if !slug.is_empty() {
      query.fetch();
    }

    Self {
      slug,
      query,
      delay,
      nav: None,
      fire_rx: None,
      navigate_at: None,
      navigated: false,
    }
  }

  fn destination(&self) -> Option<&str> {
    self.query.data().and_then(|d| d.as_deref())
  }

  fn is_not_found(&self) -> bool {
    self.slug.is_empty()
      || self.query.is_error()
      || matches!(self.query.data(), Some(None))
  }

  /// Arm the deferred navigation once, on the resolving -> resolved edge.
  fn arm_navigation(&mut self) {
    if self.nav.is_some() || self.navigated {
      return;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    self.nav = Some(DeferredNavigation::schedule(self.delay, move || {
      let _ = tx.send(());
    }));
    self.fire_rx = Some(rx);
    self.navigate_at = Some(Instant::now() + self.delay);
  }

  /// Open the destination in the system browser. At most once per view.
  fn navigate(&mut self) {
    if self.navigated {
      return;
    }
    let Some(url) = self.destination().map(str::to_string) else {
      return;
    };

    // Disarm first so a manual open cancels the pending schedule.
    if let Some(nav) = self.nav.take() {
      nav.cancel();
    }
    self.fire_rx = None;
    self.navigated = true;

    info!(slug = %self.slug, %url, "opening destination");
    if let Err(e) = open::that(&url) {
      error!(%url, error = %e, "failed to open browser");
    }
  }

  fn render_resolving(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.slug))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let text = vec![
      Line::raw(""),
      Line::styled("Redirecting...", Style::default().fg(Color::White).bold()),
      Line::raw(""),
      Line::styled(
        "Looking up the destination for this short link.",
        Style::default().fg(Color::Gray),
      ),
    ];

    frame.render_widget(
      Paragraph::new(text).block(block).alignment(Alignment::Center),
      area,
    );
  }

  fn render_resolved(&self, frame: &mut Frame, area: Rect) {
    let destination = self.destination().unwrap_or_default();

    let block = Block::default()
      .title(format!(" {} ", self.slug))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let countdown = self
      .navigate_at
      .map(|at| at.saturating_duration_since(Instant::now()))
      .unwrap_or(Duration::ZERO);

    let status = if self.navigated {
      Line::styled(
        "Opened in your browser.",
        Style::default().fg(Color::Green).bold(),
      )
    } else {
      Line::styled(
        format!("Opening automatically in {:.1}s...", countdown.as_secs_f32()),
        Style::default().fg(Color::White).bold(),
      )
    };

    let text = vec![
      Line::raw(""),
      status,
      Line::raw(""),
      Line::styled(destination.to_string(), Style::default().fg(Color::Cyan)),
      Line::raw(""),
      Line::styled(
        "Not redirected? Press Enter to open it now.",
        Style::default().fg(Color::Gray),
      ),
    ];

    frame.render_widget(
      Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true }),
      area,
    );
  }

  fn render_not_found(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Not found ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red));

    let text = vec![
      Line::raw(""),
      Line::styled("404", Style::default().fg(Color::Red).bold()),
      Line::raw(""),
      Line::styled(
        format!("The short link \"{}\" does not exist,", self.slug),
        Style::default().fg(Color::Gray),
      ),
      Line::styled(
        "was removed, or is not a valid address.",
        Style::default().fg(Color::Gray),
      ),
      Line::raw(""),
      Line::styled(
        "Press q to go back to your links.",
        Style::default().fg(Color::White),
      ),
    ];

    frame.render_widget(
      Paragraph::new(text).block(block).alignment(Alignment::Center),
      area,
    );
  }
}

impl View for RedirectView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      // Manual fallback: open immediately, cancelling the schedule.
      KeyCode::Enter | KeyCode::Char('o') => {
        self.navigate();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    if self.is_not_found() {
      self.render_not_found(frame, area);
    } else if self.destination().is_some() {
      self.render_resolved(frame, area);
    } else {
      self.render_resolving(frame, area);
    }
  }

  fn breadcrumb_label(&self) -> String {
    format!("/{}", self.slug)
  }

  fn tick(&mut self) {
    if self.query.poll() && self.destination().is_some() {
      self.arm_navigation();
    }

    let fired = self
      .fire_rx
      .as_mut()
      .map(|rx| rx.try_recv().is_ok())
      .unwrap_or(false);
    if fired {
      self.navigate();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn unreachable_client() -> ApiClient {
    // Port 9 (discard) is a safe never-listening target.
    ApiClient::new("http://127.0.0.1:9").unwrap()
  }

  #[tokio::test]
  async fn test_failed_resolve_reaches_not_found_without_navigation() {
    let mut view =
      RedirectView::new("abc".to_string(), unreachable_client(), Duration::from_millis(10));

    for _ in 0..100 {
      view.tick();
      if view.query.is_error() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(view.is_not_found());
    assert!(view.nav.is_none());

    // Well past the configured delay: still no navigation.
    tokio::time::sleep(Duration::from_millis(50)).await;
    view.tick();
    assert!(!view.navigated);
  }

  #[tokio::test]
  async fn test_empty_slug_never_issues_a_request() {
    let view = RedirectView::new(String::new(), unreachable_client(), Duration::from_millis(10));

    assert!(view.is_not_found());
    assert!(matches!(view.query.state(), crate::query::QueryState::Idle));
  }
}
