use crate::task::Task;
use crate::task_store::{StoreError, TaskStore};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Title,
    Description,
    AddButton,
    DeleteButton,
    Table,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Title,
        Focus::Description,
        Focus::AddButton,
        Focus::DeleteButton,
        Focus::Table,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_input(self) -> bool {
        matches!(self, Focus::Title | Focus::Description)
    }
}

/// The validation failures the user can run into. Shown in a blocking dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    MissingTitle,
    NoSelection,
}

impl Warning {
    pub fn message(self) -> &'static str {
        match self {
            Warning::MissingTitle => "Title is required!",
            Warning::NoSelection => "Select a task to delete",
        }
    }
}

/// A user gesture, already decoded from whatever input device produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Type(char),
    Erase,
    FocusNext,
    FocusPrev,
    Focus(Focus),
    Activate,
    Add,
    Delete,
    SelectNext,
    SelectPrev,
    SelectFirst,
    SelectLast,
    SelectRow(usize),
    Dismiss,
    Close,
}

#[derive(Debug)]
pub struct App {
    store: TaskStore,
    pub title: String,
    pub description: String,
    pub focus: Focus,
    tasks: Vec<Task>,
    selected: Option<usize>,
    warning: Option<Warning>,
    running: bool,
}

impl App {
    pub fn new(store: TaskStore) -> Result<Self, StoreError> {
        let mut app = Self {
            store,
            title: String::new(),
            description: String::new(),
            focus: Focus::Title,
            tasks: Vec::new(),
            selected: None,
            warning: None,
            running: true,
        };
        app.refresh()?;
        Ok(app)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn warning(&self) -> Option<Warning> {
        self.warning
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Dispatches one gesture. Storage failures are returned untouched and
    /// end the session.
    pub fn handle(&mut self, gesture: Gesture) -> Result<(), StoreError> {
        if gesture == Gesture::Close {
            self.running = false;
            return Ok(());
        }
        // the warning dialog is modal
        if self.warning.is_some() {
            if gesture == Gesture::Dismiss {
                self.warning = None;
            }
            return Ok(());
        }

        match gesture {
            Gesture::Type(c) => {
                if let Some(field) = self.focused_input() {
                    field.push(c);
                }
            }
            Gesture::Erase => {
                if let Some(field) = self.focused_input() {
                    field.pop();
                }
            }
            Gesture::FocusNext => self.focus = self.focus.next(),
            Gesture::FocusPrev => self.focus = self.focus.prev(),
            Gesture::Focus(focus) => self.focus = focus,
            Gesture::Activate => match self.focus {
                Focus::Title | Focus::Description | Focus::AddButton => self.add_task()?,
                Focus::DeleteButton => self.delete_selected()?,
                Focus::Table => {}
            },
            Gesture::Add => self.add_task()?,
            Gesture::Delete => self.delete_selected()?,
            Gesture::SelectNext => {
                if !self.tasks.is_empty() {
                    let last = self.tasks.len() - 1;
                    self.selected = Some(self.selected.map_or(0, |i| (i + 1).min(last)));
                }
            }
            Gesture::SelectPrev => {
                if !self.tasks.is_empty() {
                    self.selected = Some(self.selected.map_or(0, |i| i.saturating_sub(1)));
                }
            }
            Gesture::SelectFirst => {
                if !self.tasks.is_empty() {
                    self.selected = Some(0);
                }
            }
            Gesture::SelectLast => {
                if !self.tasks.is_empty() {
                    self.selected = Some(self.tasks.len() - 1);
                }
            }
            Gesture::SelectRow(row) => {
                if row < self.tasks.len() {
                    self.selected = Some(row);
                    self.focus = Focus::Table;
                }
            }
            Gesture::Dismiss | Gesture::Close => {}
        }
        Ok(())
    }

    fn focused_input(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Title => Some(&mut self.title),
            Focus::Description => Some(&mut self.description),
            _ => None,
        }
    }

    pub fn add_task(&mut self) -> Result<(), StoreError> {
        let title = self.title.trim();
        if title.is_empty() {
            warn!("add rejected: empty title");
            self.warning = Some(Warning::MissingTitle);
            return Ok(());
        }
        let id = self.store.create(title, self.description.trim())?;
        info!(id, "task added");

        self.title.clear();
        self.description.clear();
        self.focus = Focus::Title;
        self.refresh()
    }

    pub fn delete_selected(&mut self) -> Result<(), StoreError> {
        let Some(id) = self.selected.and_then(|i| self.tasks.get(i)).map(|t| t.id) else {
            warn!("delete rejected: no row selected");
            self.warning = Some(Warning::NoSelection);
            return Ok(());
        };
        self.store.delete(id)?;
        info!(id, "task deleted");
        self.refresh()
    }

    /// Replaces the table contents with a fresh snapshot from storage.
    pub fn refresh(&mut self) -> Result<(), StoreError> {
        self.tasks = self.store.list()?;
        self.selected = match self.tasks.len() {
            0 => None,
            len => self.selected.map(|i| i.min(len - 1)),
        };
        Ok(())
    }
}
