use crate::api::ApiClient;
use crate::commands;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{LinkListView, RedirectView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always the link list
  view_stack: Vec<Box<dyn View>>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Transient app-level message (unknown command, usage errors)
  status: Option<String>,

  /// Application configuration
  config: Config,

  /// API client shared by all views
  client: ApiClient,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  /// Build the app. `initial_slug` is the `/{slug}` route: start with the
  /// redirect view stacked over the list.
  pub fn new(config: Config, initial_slug: Option<String>) -> Result<Self> {
    let client = ApiClient::new(&config.server.url)?;

    let mut view_stack: Vec<Box<dyn View>> =
      vec![Box::new(LinkListView::new(client.clone(), config.clone()))];
    if let Some(slug) = initial_slug {
      view_stack.push(Box::new(RedirectView::new(
        slug,
        client.clone(),
        config.redirect_delay(),
      )));
    }

    Ok(Self {
      view_stack,
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      status: None,
      config,
      client,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        // Every stacked view keeps polling so mutations settle while a
        // redirect view is on top.
        for view in &mut self.view_stack {
          view.tick();
        }
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    self.status = None;

    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let capturing_text = self
      .view_stack
      .last()
      .map(|v| v.wants_text_input())
      .unwrap_or(false);
    if key.code == KeyCode::Char(':') && !capturing_text {
      self.mode = Mode::Command;
      self.command_input.clear();
      self.selected_suggestion = 0;
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };

    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0;
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    let (word, args) = commands::split_input(&self.command_input);

    // Resolve through the selected suggestion when one applies.
    let suggestions = commands::get_suggestions(&self.command_input);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      word.to_lowercase()
    };
    let args = args.to_string();

    match cmd.as_str() {
      "links" => {
        // Fresh root view, fresh fetch.
        self.view_stack.clear();
        self
          .view_stack
          .push(Box::new(LinkListView::new(self.client.clone(), self.config.clone())));
      }
      "open" => {
        if args.is_empty() {
          self.status = Some("usage: open <slug>".to_string());
        } else {
          self.view_stack.push(Box::new(RedirectView::new(
            args,
            self.client.clone(),
            self.config.redirect_delay(),
          )));
        }
      }
      "quit" => {
        self.should_quit = true;
      }
      "" => {}
      other => {
        self.status = Some(format!("Unknown command: {}", other));
      }
    }
    self.command_input.clear();
  }

  // Accessors for UI rendering

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }

  pub fn server_url(&self) -> &str {
    &self.config.server.url
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static commands::Command> {
    commands::get_suggestions(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }
}
