use crate::board::TaskBoard;
use crate::card::{CardCallbacks, TaskCard, TaskCardView};
use crate::error::AppError;
use crate::lookup::{CategoryLookups, CategoryUpdate};
use crate::route::NavigationIntent;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use futures_util::StreamExt;
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Style},
    text::{Line, Span},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct App {
    pub board: TaskBoard,
    pub card: TaskCard,
    pub location: Option<String>,
    card_area: Rect,
}

impl App {
    /// Mounts the card; navigation intents it issues arrive on the receiver.
    pub fn new(board: TaskBoard) -> (Self, mpsc::UnboundedReceiver<NavigationIntent>) {
        let (intents, rx) = mpsc::unbounded_channel();
        let callbacks = CardCallbacks::default().on_navigate(move |intent| {
            if intents.send(intent.clone()).is_err() {
                debug!(path = %intent.path, "navigation receiver closed");
            }
        });
        let app = Self {
            board,
            card: TaskCard::mount(callbacks),
            location: None,
            card_area: Rect::default(),
        };
        (app, rx)
    }
}

fn screen_layout(area: Rect) -> [Rect; 3] {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(TaskCardView::HEIGHT),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area)
}

/// Anything the UI loop wakes up for.
#[derive(Debug)]
pub enum Input {
    Category(CategoryUpdate),
    Navigate(NavigationIntent),
    Terminal(Event),
}

impl App {
    /// One render pass: sync the card with the selected task, then draw.
    pub fn draw<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        lookups: &CategoryLookups,
    ) -> Result<(), AppError> {
        let task = self.board.selected()?;
        self.card.sync(task, lookups);

        let mut card_area = self.card_area;
        let location = self.location.as_deref().unwrap_or("/");
        let position = format!(
            " {}/{}  location: {location}  (←/→ select, Enter open, q quit)",
            self.board.selected_task + 1,
            self.board.tasks.len(),
        );
        terminal.draw(|f| {
            let [card, _, status] = screen_layout(f.area());
            card_area = card;
            f.render_widget(self.card.view(task), card);
            f.render_widget(
                Line::from(Span::styled(position, Style::default().fg(Color::DarkGray))),
                status,
            );
        })?;
        self.card_area = card_area;
        Ok(())
    }

    /// Returns `true` when quit is requested.
    pub fn handle(&mut self, input: Input) -> bool {
        match input {
            Input::Category(update) => {
                self.card.apply(update);
                false
            }
            Input::Navigate(intent) => {
                info!(path = %intent.path, "navigating");
                self.location = Some(intent.path);
                false
            }
            Input::Terminal(event) => handle_event(self, event),
        }
    }
}

pub async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    lookups: &CategoryLookups,
    mut updates: mpsc::UnboundedReceiver<CategoryUpdate>,
    mut intents: mpsc::UnboundedReceiver<NavigationIntent>,
) -> Result<(), AppError> {
    let mut events = EventStream::new();
    loop {
        app.draw(terminal, lookups)?;

        let input = tokio::select! {
            Some(update) = updates.recv() => Input::Category(update),
            Some(intent) = intents.recv() => Input::Navigate(intent),
            event = events.next() => match event {
                Some(Ok(event)) => Input::Terminal(event),
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(()),
            },
        };
        if app.handle(input) {
            return Ok(());
        }
    }
}

/// Returns `true` when quit is requested.
fn handle_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Left | KeyCode::Char('h') => app.board.move_selection(-1),
            KeyCode::Right | KeyCode::Char('l') => app.board.move_selection(1),
            KeyCode::Enter => {
                app.card.activate();
            }
            _ => {}
        },
        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
            app.card
                .click(app.card_area, Position::new(mouse.column, mouse.row));
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::RetryPolicy;
    use crate::resolver::CategoryFile;
    use crate::task::{Task, TaskState};
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};
    use ratatui::backend::TestBackend;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn app() -> (App, mpsc::UnboundedReceiver<NavigationIntent>) {
        App::new(TaskBoard::new(vec![
            Task::new(42, TaskState::Pending, "Write spec", "cat-7"),
            Task::new(43, TaskState::Done, "Ship it", "cat-1"),
        ]))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn layout_reserves_card_and_status_rows() {
        let [card, _, status] = screen_layout(Rect::new(0, 0, 80, 24));
        assert_eq!(card.height, TaskCardView::HEIGHT);
        assert_eq!(status.y, 23);
    }

    #[test]
    fn keys_move_selection_and_quit() {
        let (mut app, _rx) = app();
        assert!(!handle_event(&mut app, key(KeyCode::Right)));
        assert_eq!(app.board.selected().unwrap().task_id, 43);
        assert!(!handle_event(&mut app, key(KeyCode::Char('h'))));
        assert_eq!(app.board.selected().unwrap().task_id, 42);
        assert!(handle_event(&mut app, key(KeyCode::Char('q'))));
    }

    #[tokio::test]
    async fn enter_and_click_send_navigation_intents() {
        let (mut app, mut rx) = app();
        let (lookups, _updates) =
            CategoryLookups::new(Arc::new(CategoryFile::new("missing.json")), RetryPolicy::none());
        app.card.sync(app.board.selected().unwrap(), &lookups);
        app.card_area = Rect::new(0, 0, 40, TaskCardView::HEIGHT);

        handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(rx.try_recv().unwrap().path, "/tasks/42");

        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row: 2,
            modifiers: KeyModifiers::NONE,
        });
        handle_event(&mut app, click);
        assert_eq!(rx.try_recv().unwrap().path, "/tasks/42");
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn render_loop_applies_updates_and_navigation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("categories.json");
        fs::write(&path, r#"{"cat-7":"Docs"}"#).unwrap();
        let (lookups, mut updates) =
            CategoryLookups::new(Arc::new(CategoryFile::new(&path)), RetryPolicy::none());
        let (mut app, mut intents) = app();
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();

        app.draw(&mut terminal, &lookups).unwrap();
        let first = screen(&terminal);
        assert!(first.contains("Category: Loading…"));
        assert!(first.contains("location: /"));

        let update = updates.recv().await.unwrap();
        assert!(!app.handle(Input::Category(update)));
        app.draw(&mut terminal, &lookups).unwrap();
        assert!(screen(&terminal).contains("Category: Docs"));
        assert!(updates.try_recv().is_err());

        assert!(!app.handle(Input::Terminal(key(KeyCode::Enter))));
        let intent = intents.try_recv().unwrap();
        assert!(!app.handle(Input::Navigate(intent)));
        app.draw(&mut terminal, &lookups).unwrap();
        let last = screen(&terminal);
        assert!(last.contains("location: /tasks/42"));
        assert!(last.contains("Category: Docs"));

        assert!(app.handle(Input::Terminal(key(KeyCode::Char('q')))));
    }
}
