use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back; quits at the root)
  Pop,
}

/// Trait for view behavior
///
/// Views handle their own input and return actions for the App to execute.
/// Views that load data asynchronously own a `Query`/`Mutation` and poll it
/// in `tick()`; dropping a view must cancel whatever it scheduled.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// True while the view is capturing free text (a focused form field).
  /// The app suspends global shortcuts like `:` so typing passes through.
  fn wants_text_input(&self) -> bool {
    false
  }

  /// Called on each tick to allow views to poll async state
  fn tick(&mut self) {}
}
