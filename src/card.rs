//! The task card: a mounted view over one [`Task`] at a time.
//!
//! [`TaskCard`] owns the per-mount category state and decides when a lookup
//! is needed. [`TaskCardView`] is the pure widget drawn from a task and the
//! current [`CategoryName`].

use crate::lookup::{CategoryLookups, CategoryUpdate, LookupOutcome, LookupTicket, MountId};
use crate::route::NavigationIntent;
use crate::task::{CategoryId, Task, TaskId};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const LOADING_LABEL: &str = "Loading…";
pub const UNKNOWN_CATEGORY_LABEL: &str = "Unknown category";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryName {
    Loading,
    Resolved(String),
    /// Lookup gave up; terminal for the current category id.
    Unknown,
}

impl CategoryName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Loading => LOADING_LABEL,
            Self::Resolved(name) => name,
            Self::Unknown => UNKNOWN_CATEGORY_LABEL,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

type NavigateFn = Box<dyn FnMut(&NavigationIntent)>;
type HeaderClickFn = Box<dyn FnMut(TaskId)>;

/// Optional reactions to user input. Both default to doing nothing.
pub struct CardCallbacks {
    on_navigate: NavigateFn,
    on_header_click: HeaderClickFn,
}

impl CardCallbacks {
    pub fn on_navigate(mut self, f: impl FnMut(&NavigationIntent) + 'static) -> Self {
        self.on_navigate = Box::new(f);
        self
    }

    pub fn on_header_click(mut self, f: impl FnMut(TaskId) + 'static) -> Self {
        self.on_header_click = Box::new(f);
        self
    }
}

impl Default for CardCallbacks {
    fn default() -> Self {
        Self {
            on_navigate: Box::new(|_| {}),
            on_header_click: Box::new(|_| {}),
        }
    }
}

pub struct TaskCard {
    mount: MountId,
    generation: u64,
    tracked: Option<CategoryId>,
    category: CategoryName,
    in_flight: Option<JoinHandle<()>>,
    task_id: Option<TaskId>,
    callbacks: CardCallbacks,
}

impl TaskCard {
    pub fn mount(callbacks: CardCallbacks) -> Self {
        Self {
            mount: MountId::next(),
            generation: 0,
            tracked: None,
            category: CategoryName::Loading,
            in_flight: None,
            task_id: None,
            callbacks,
        }
    }

    /// Called once per render pass. Starts a lookup only when the task's
    /// category differs from the one already tracked; returns whether it did.
    pub fn sync(&mut self, task: &Task, lookups: &CategoryLookups) -> bool {
        self.task_id = Some(task.task_id);
        if self.tracked.as_ref() == Some(&task.data.category) {
            return false;
        }

        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.generation += 1;
        self.tracked = Some(task.data.category.clone());
        self.category = CategoryName::Loading;

        let ticket = LookupTicket {
            mount: self.mount,
            generation: self.generation,
        };
        self.in_flight = Some(lookups.spawn(ticket, task.data.category.clone()));
        true
    }

    /// Applies a finished lookup. Returns `true` when the display changed.
    pub fn apply(&mut self, update: CategoryUpdate) -> bool {
        let current = LookupTicket {
            mount: self.mount,
            generation: self.generation,
        };
        if update.ticket != current || self.tracked.as_ref() != Some(&update.category) {
            debug!(
                category = %update.category,
                generation = update.ticket.generation,
                current = self.generation,
                "discarding stale category update"
            );
            return false;
        }
        if self.category.is_settled() {
            return false;
        }

        self.in_flight = None;
        self.category = match update.outcome {
            LookupOutcome::Resolved(name) => CategoryName::Resolved(name),
            LookupOutcome::Failed(err) => {
                warn!(category = %update.category, error = %err, "giving up on category name");
                CategoryName::Unknown
            }
        };
        true
    }

    pub fn category(&self) -> &CategoryName {
        &self.category
    }

    pub fn view<'a>(&'a self, task: &'a Task) -> TaskCardView<'a> {
        TaskCardView::new(task, &self.category)
    }

    /// Navigates to the detail route of the last synced task.
    pub fn activate(&mut self) -> Option<NavigationIntent> {
        let intent = NavigationIntent::task_detail(self.task_id?);
        (self.callbacks.on_navigate)(&intent);
        Some(intent)
    }

    /// Handles a click at `position` on a card drawn into `area`.
    pub fn click(&mut self, area: Rect, position: Position) -> Option<NavigationIntent> {
        if !area.contains(position) {
            return None;
        }
        let task_id = self.task_id?;
        if CardLayout::new(area).header.contains(position) {
            (self.callbacks.on_header_click)(task_id);
        }
        self.activate()
    }
}

impl Drop for TaskCard {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

/// Regions of a card drawn into a given area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardLayout {
    pub header: Rect,
    pub description: Rect,
    pub category: Rect,
}

impl CardLayout {
    pub fn new(area: Rect) -> Self {
        let inner = card_block().inner(area);
        let [header, description, category] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .areas(inner);
        Self {
            header,
            description,
            category,
        }
    }
}

fn card_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
}

pub struct TaskCardView<'a> {
    task: &'a Task,
    category: &'a CategoryName,
}

impl<'a> TaskCardView<'a> {
    /// Rows needed to draw the whole card, borders included.
    pub const HEIGHT: u16 = 6;

    pub fn new(task: &'a Task, category: &'a CategoryName) -> Self {
        Self { task, category }
    }

    /// Title, status, description and category text in display order.
    pub fn lines(&self) -> [String; 4] {
        [
            format!("Task #{}", self.task.task_id),
            format!("Status: {}", self.task.state_label()),
            self.task.data.description.clone(),
            format!("Category: {}", self.category.as_str()),
        ]
    }
}

impl Widget for TaskCardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [title, status, description, category] = self.lines();
        let layout = CardLayout::new(area);
        card_block().render(area, buf);

        let status = Line::from(Span::styled(status, Style::default().fg(Color::Green)));
        let status_width = u16::try_from(status.width()).unwrap_or(u16::MAX);
        let [title_area, status_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(status_width)])
                .spacing(1)
                .areas(layout.header);
        Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .render(title_area, buf);
        status.render(status_area, buf);

        Paragraph::new(description)
            .block(
                Block::default()
                    .borders(Borders::BOTTOM)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .render(layout.description, buf);

        Line::from(Span::styled(category, Style::default().fg(Color::Magenta)))
            .render(layout.category, buf);
    }
}
