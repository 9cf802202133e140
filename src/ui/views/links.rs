//! Root view: create form on the left, link list on the right.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::api::{ApiClient, CreateLinkRequest, Link};
use crate::config::Config;
use crate::links::LinksSync;
use crate::query::{MutationState, QueryState};
use crate::ui::components::{validate_original_url, validate_slug, FieldResult, FormField};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{short_display, truncate};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::RedirectView;

/// How long transient status messages stay on screen.
const STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
  List,
  Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormFocus {
  OriginalUrl,
  Slug,
}

/// Owned summary of a settled create mutation, so status handling does not
/// hold a borrow of the sync layer while mutating view state.
enum CreateOutcome {
  Created(String),
  Conflict,
  Failed(String),
  Pending,
}

/// View for managing short links.
pub struct LinkListView {
  sync: LinksSync<ApiClient>,
  config: Config,
  list_state: ListState,
  focus: Focus,
  form_focus: FormFocus,
  original_url: FormField,
  slug: FormField,
  form_error: Option<String>,
  /// Delete armed for (id, slug), waiting for `y`.
  pending_delete: Option<(String, String)>,
  status: Option<(String, Instant)>,
}

impl LinkListView {
  pub fn new(client: ApiClient, config: Config) -> Self {
    Self {
      sync: LinksSync::new(client),
      config,
      list_state: ListState::default(),
      focus: Focus::List,
      form_focus: FormFocus::OriginalUrl,
      original_url: FormField::new("Destination URL"),
      slug: FormField::new("Short link"),
      form_error: None,
      pending_delete: None,
      status: None,
    }
  }

  fn links(&self) -> &[Link] {
    self.sync.links()
  }

  fn selected_link(&self) -> Option<&Link> {
    self.list_state.selected().and_then(|i| self.links().get(i))
  }

  fn set_status(&mut self, message: impl Into<String>) {
    self.status = Some((message.into(), Instant::now()));
  }

  fn short_url(&self, link: &Link) -> String {
    format!("{}/{}", self.sync.client().base_url(), link.slug)
  }

  fn copy_selected(&mut self) {
    let Some(link) = self.selected_link() else {
      return;
    };
    let url = self.short_url(link);

    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(url.clone())) {
      Ok(()) => self.set_status(format!("Copied {}", url)),
      Err(e) => self.set_status(format!("Clipboard unavailable: {}", e)),
    }
  }

  /// Validate both fields and start the create mutation.
  ///
  /// Validation failures stay in the form; no request goes out.
  fn submit_form(&mut self) {
    self.form_error = None;

    let mut valid = true;
    if let Err(msg) = validate_original_url(self.original_url.value()) {
      self.original_url.set_error(msg);
      valid = false;
    }
    if let Err(msg) = validate_slug(self.slug.value()) {
      self.slug.set_error(msg);
      valid = false;
    }
    if !valid || self.sync.create_pending() {
      return;
    }

    self.sync.create(CreateLinkRequest {
      original_url: self.original_url.value().to_string(),
      slug: Some(self.slug.value().to_string()),
    });
  }

  fn handle_form_key(&mut self, key: KeyEvent) -> ViewAction {
    let field = match self.form_focus {
      FormFocus::OriginalUrl => &mut self.original_url,
      FormFocus::Slug => &mut self.slug,
    };

    match field.handle_key(key) {
      FieldResult::Submitted => self.submit_form(),
      FieldResult::Cancelled => self.focus = Focus::List,
      FieldResult::Consumed => self.form_error = None,
      FieldResult::NotHandled => match key.code {
        KeyCode::Tab | KeyCode::Down | KeyCode::BackTab | KeyCode::Up => {
          self.form_focus = match self.form_focus {
            FormFocus::OriginalUrl => FormFocus::Slug,
            FormFocus::Slug => FormFocus::OriginalUrl,
          };
        }
        _ => {}
      },
    }
    ViewAction::None
  }

  fn handle_list_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Tab | KeyCode::Char('n') => {
        self.focus = Focus::Form;
        self.form_focus = FormFocus::OriginalUrl;
      }
      KeyCode::Char('r') => {
        self.sync.refresh();
      }
      KeyCode::Char('c') => {
        self.copy_selected();
      }
      KeyCode::Char('d') => {
        if !self.sync.delete_pending() {
          if let Some(link) = self.selected_link() {
            self.pending_delete = Some((link.id.clone(), link.slug.clone()));
          }
        }
      }
      KeyCode::Char('e') => {
        if !self.sync.export_pending() {
          self.sync.export(self.config.export_dir());
          self.set_status("Exporting links...");
        }
      }
      KeyCode::Enter => {
        if let Some(link) = self.selected_link() {
          return ViewAction::Push(Box::new(RedirectView::new(
            link.slug.clone(),
            self.sync.client().clone(),
            self.config.redirect_delay(),
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render_form(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" New link ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(if self.focus == Focus::Form {
        Color::Blue
      } else {
        Color::DarkGray
      }));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(4), // destination field + error
        Constraint::Length(4), // slug field + error
        Constraint::Length(1), // root error
        Constraint::Length(1), // hint / pending state
        Constraint::Min(0),
      ])
      .split(inner);

    let focused = self.focus == Focus::Form;
    self.original_url.render(
      frame,
      chunks[0],
      focused && self.form_focus == FormFocus::OriginalUrl,
    );
    self
      .slug
      .render(frame, chunks[1], focused && self.form_focus == FormFocus::Slug);

    if let Some(error) = &self.form_error {
      frame.render_widget(
        Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
        chunks[2],
      );
    }

    let hint = if self.sync.create_pending() {
      Line::styled("Saving...", Style::default().fg(Color::Yellow))
    } else if focused {
      Line::styled(
        "Enter:save  Tab:next field  Esc:back to list",
        Style::default().fg(Color::DarkGray),
      )
    } else {
      Line::styled("Tab:edit form", Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(Paragraph::new(hint), chunks[3]);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.links().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.sync.list_state() {
      QueryState::Loading => " My links (loading...) ".to_string(),
      QueryState::Error(e) => format!(" My links (error: {}) ", truncate(e, 40)),
      _ => format!(" My links ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(if self.focus == Focus::List {
        Color::Blue
      } else {
        Color::DarkGray
      }));

    if len == 0 {
      let content = if self.sync.is_loading() {
        ""
      } else if self.sync.list_state().is_error() {
        "Failed to load links. Press 'r' to retry."
      } else {
        "No links yet. Press Tab and create your first short link."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let base_url = self.sync.client().base_url().to_string();
    let items: Vec<ListItem> = self
      .links()
      .iter()
      .map(|link| {
        let line = Line::from(vec![
          Span::styled(
            format!("{:<24}", truncate(&short_display(&base_url, &link.slug), 24)),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(
            format!("{:>6} clicks  ", link.clicks),
            Style::default().fg(Color::Yellow),
          ),
          Span::styled(
            truncate(&link.original_url, 48),
            Style::default().fg(Color::Gray),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_status(&self, frame: &mut Frame, area: Rect) {
    let line = if let Some((_, slug)) = &self.pending_delete {
      Line::styled(
        format!("Delete {}? y:confirm  any other key:cancel", slug),
        Style::default().fg(Color::Red),
      )
    } else if let Some((message, _)) = &self.status {
      Line::styled(message.clone(), Style::default().fg(Color::Green))
    } else {
      Line::styled(
        "j/k:nav  Enter:follow  c:copy  d:delete  e:export CSV  r:refresh  Tab:new link  q:quit",
        Style::default().fg(Color::DarkGray),
      )
    };
    frame.render_widget(Paragraph::new(line), area);
  }
}

impl View for LinkListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // An armed delete captures the next key entirely.
    if let Some((id, slug)) = self.pending_delete.take() {
      if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
        self.set_status(format!("Deleting {}...", slug));
        self.sync.delete(id);
      }
      return ViewAction::None;
    }

    match self.focus {
      Focus::Form => self.handle_form_key(key),
      Focus::List => self.handle_list_key(key),
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let rows = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(1)])
      .split(area);

    let panes = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
      .split(rows[0]);

    self.render_form(frame, panes[0]);
    self.render_list(frame, panes[1]);
    self.render_status(frame, rows[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Links".to_string()
  }

  fn wants_text_input(&self) -> bool {
    self.focus == Focus::Form
  }

  fn tick(&mut self) {
    let events = self.sync.poll();

    if events.create_completed {
      let outcome = match self.sync.create_state() {
        MutationState::Success(link) => CreateOutcome::Created(self.short_url(link)),
        MutationState::Error(e) if e.is_slug_conflict() => CreateOutcome::Conflict,
        MutationState::Error(e) => CreateOutcome::Failed(e.to_string()),
        _ => CreateOutcome::Pending,
      };
      match outcome {
        CreateOutcome::Created(url) => {
          self.original_url.reset();
          self.slug.reset();
          self.form_error = None;
          self.focus = Focus::List;
          self.set_status(format!("Created {}", url));
        }
        // Field-level error; the form keeps its values.
        CreateOutcome::Conflict => self.slug.set_error("This short link already exists"),
        CreateOutcome::Failed(e) => self.form_error = Some(format!("Could not create link: {}", e)),
        CreateOutcome::Pending => {}
      }
    }

    if events.delete_completed {
      let message = match self.sync.delete_state() {
        MutationState::Success(_) => Some("Link deleted".to_string()),
        MutationState::Error(e) => Some(format!("Delete failed, reloading list: {}", e)),
        _ => None,
      };
      if let Some(message) = message {
        self.set_status(message);
      }
    }

    if events.export_completed {
      let message = match self.sync.export_state() {
        MutationState::Success(path) => Some(format!("Saved {}", path.display())),
        MutationState::Error(e) => Some(format!("Export failed: {}", e)),
        _ => None,
      };
      if let Some(message) = message {
        self.set_status(message);
      }
    }

    if let Some((_, shown_at)) = &self.status {
      if shown_at.elapsed() > STATUS_TTL {
        self.status = None;
      }
    }
  }
}
