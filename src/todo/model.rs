//! Todo state and its transitions.

use crate::pipeline::Merge;

/// One todo item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub completed: bool,
}

/// Which todos the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Self::All, Self::Active, Self::Completed];

    /// Route path (`"/"`, `"/active"`, `"/completed"`).
    pub const fn path(self) -> &'static str {
        match self {
            Self::All => "/",
            Self::Active => "/active",
            Self::Completed => "/completed",
        }
    }

    /// Link target for the filter bar.
    pub fn href(self) -> String {
        format!("#{}", self.path())
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }

    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

/// Application state of the todo app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoState {
    pub todos: Vec<Todo>,
    pub filter: Filter,
    /// Text of the new-todo input.
    pub input: String,
    /// Todo whose title is being edited.
    pub editing: Option<u64>,
    /// The router landed on an unknown path.
    pub not_found: bool,
    pub next_id: u64,
}

impl Default for TodoState {
    fn default() -> Self {
        Self {
            todos: Vec::new(),
            filter: Filter::All,
            input: String::new(),
            editing: None,
            not_found: false,
            next_id: 1,
        }
    }
}

impl TodoState {
    /// Append a todo with the trimmed `title`. Blank titles are ignored.
    pub fn add(&mut self, title: &str) -> Option<u64> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.todos.push(Todo { id, title: title.to_string(), completed: false });
        Some(id)
    }

    pub fn toggle(&mut self, id: u64) {
        if let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) {
            todo.completed = !todo.completed;
        }
    }

    /// Complete everything, or reopen everything when all are complete.
    pub fn toggle_all(&mut self) {
        let complete = !self.all_completed();
        for todo in &mut self.todos {
            todo.completed = complete;
        }
    }

    pub fn remove(&mut self, id: u64) {
        self.todos.retain(|todo| todo.id != id);
        if self.editing == Some(id) {
            self.editing = None;
        }
    }

    /// Finish editing `id`: a blank title removes the todo.
    pub fn save_edit(&mut self, id: u64, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            self.remove(id);
        } else if let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) {
            todo.title = title.to_string();
        }
        self.editing = None;
    }

    pub fn clear_completed(&mut self) {
        self.todos.retain(|todo| !todo.completed);
    }

    /// Todos passing the current filter.
    pub fn visible(&self) -> impl Iterator<Item = &Todo> {
        self.todos.iter().filter(|todo| self.filter.matches(todo))
    }

    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.todos.len() - self.active_count()
    }

    pub fn all_completed(&self) -> bool {
        !self.todos.is_empty() && self.active_count() == 0
    }
}

/// Partial update of [`TodoState`]. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub todos: Option<Vec<Todo>>,
    pub filter: Option<Filter>,
    pub input: Option<String>,
    pub editing: Option<Option<u64>>,
    pub not_found: Option<bool>,
}

impl TodoPatch {
    pub fn filter(filter: Filter) -> Self {
        Self { filter: Some(filter), not_found: Some(false), ..Self::default() }
    }

    pub fn input(input: impl Into<String>) -> Self {
        Self { input: Some(input.into()), ..Self::default() }
    }

    pub fn editing(editing: Option<u64>) -> Self {
        Self { editing: Some(editing), ..Self::default() }
    }
}

impl Merge for TodoState {
    type Patch = TodoPatch;

    fn merge(&mut self, patch: TodoPatch) {
        if let Some(todos) = patch.todos {
            self.todos = todos;
        }
        if let Some(filter) = patch.filter {
            self.filter = filter;
        }
        if let Some(input) = patch.input {
            self.input = input;
        }
        if let Some(editing) = patch.editing {
            self.editing = editing;
        }
        if let Some(not_found) = patch.not_found {
            self.not_found = not_found;
        }
    }
}

/// `"1 item"`, `"2 items"`.
pub fn pluralize(count: usize, word: &str) -> String {
    if count == 1 { word.to_string() } else { format!("{word}s") }
}
