//! TodoMVC markup.
//!
//! The header input uses fixed delegated ids registered through the handle;
//! every other handler is attached with [`Element::on`] and gets a generated
//! id from the reconciler.

use crate::pipeline::Handle;
use crate::primitives::{text, Element, Node};
use crate::renderer::Document;
use crate::types::{DomEvent, EventKind};

use super::model::{pluralize, Filter, Todo, TodoPatch, TodoState};

/// Delegated id of the new-todo keydown handler.
pub const NEW_TODO_KEYDOWN: &str = "new-todo-keydown";
/// Delegated id of the new-todo input handler.
pub const NEW_TODO_INPUT: &str = "new-todo-input";
/// Delegated id of the toggle-all change handler.
pub const TOGGLE_ALL_CHANGE: &str = "toggle-all-change";

type AppHandle<D> = Handle<TodoState, D>;

/// Render the whole application.
pub fn render<D: Document + 'static>(state: &TodoState, handle: &AppHandle<D>) -> Node {
    if state.not_found {
        return not_found();
    }
    register_header(handle);

    let has_todos = !state.todos.is_empty();
    Element::new("section")
        .class("todoapp")
        .child(header(state))
        .child_opt(has_todos.then(|| main_section(state, handle)))
        .child_opt(has_todos.then(|| footer(state, handle)))
        .into()
}

fn register_header<D: Document + 'static>(handle: &AppHandle<D>) {
    let h = handle.clone();
    handle.register(EventKind::KeyDown, NEW_TODO_KEYDOWN, move |event: &DomEvent| {
        if !event.is_key("Enter") {
            return;
        }
        let typed = event.value.clone();
        h.update(|state| {
            let title = typed.unwrap_or_else(|| state.input.clone());
            if state.add(&title).is_some() {
                state.input.clear();
            }
        });
    });

    let h = handle.clone();
    handle.register(EventKind::Input, NEW_TODO_INPUT, move |event: &DomEvent| {
        h.set_state(TodoPatch::input(event.value.clone().unwrap_or_default()));
    });

    let h = handle.clone();
    handle.register(EventKind::Change, TOGGLE_ALL_CHANGE, move |_: &DomEvent| {
        h.update(TodoState::toggle_all);
    });
}

fn header(state: &TodoState) -> Element {
    Element::new("header")
        .class("header")
        .child(Element::new("h1").child("todos"))
        .child(
            Element::new("input")
                .class("new-todo")
                .attr("placeholder", "What needs to be done?")
                .attr("autofocus", true)
                .value(state.input.as_str())
                .delegate(EventKind::KeyDown, NEW_TODO_KEYDOWN)
                .delegate(EventKind::Input, NEW_TODO_INPUT),
        )
}

fn main_section<D: Document + 'static>(state: &TodoState, handle: &AppHandle<D>) -> Element {
    Element::new("section")
        .class("main")
        .child(
            Element::new("input")
                .id("toggle-all")
                .class("toggle-all")
                .attr("type", "checkbox")
                .checked(state.all_completed())
                .delegate(EventKind::Change, TOGGLE_ALL_CHANGE),
        )
        .child(
            Element::new("label")
                .attr("for", "toggle-all")
                .child("Mark all as complete"),
        )
        .child(
            Element::new("ul")
                .class("todo-list")
                .children(state.visible().map(|todo| item(todo, state.editing == Some(todo.id), handle))),
        )
}

fn item<D: Document + 'static>(todo: &Todo, editing: bool, handle: &AppHandle<D>) -> Element {
    let id = todo.id;
    let class = match (todo.completed, editing) {
        (true, true) => "completed editing",
        (true, false) => "completed",
        (false, true) => "editing",
        (false, false) => "",
    };

    let toggle = handle.clone();
    let edit = handle.clone();
    let destroy = handle.clone();
    let view = Element::new("div")
        .class("view")
        .child(
            Element::new("input")
                .class("toggle")
                .attr("type", "checkbox")
                .checked(todo.completed)
                .on(EventKind::Change, move |_| toggle.update(|s| s.toggle(id))),
        )
        .child(
            Element::new("label")
                .on(EventKind::DoubleClick, move |_| edit.set_state(TodoPatch::editing(Some(id))))
                .child(text(todo.title.as_str())),
        )
        .child(
            Element::new("button")
                .class("destroy")
                .on(EventKind::Click, move |_| destroy.update(|s| s.remove(id))),
        );

    let li = Element::new("li").key(id).class(class).child(view);
    if !editing {
        return li;
    }

    let save = handle.clone();
    li.child(
        Element::new("input")
            .class("edit")
            .value(todo.title.as_str())
            .on(EventKind::KeyDown, move |event| {
                if event.is_key("Enter") {
                    let title = event.value.clone().unwrap_or_default();
                    save.update(|s| s.save_edit(id, &title));
                } else if event.is_key("Escape") {
                    save.set_state(TodoPatch::editing(None));
                }
            }),
    )
}

fn footer<D: Document + 'static>(state: &TodoState, handle: &AppHandle<D>) -> Element {
    let active = state.active_count();
    let filters = Filter::ALL.into_iter().map(|filter| {
        let h = handle.clone();
        Element::new("li").child(
            Element::new("a")
                .class(if state.filter == filter { "selected" } else { "" })
                .attr("href", filter.href())
                // Clicks reach handlers only after the double-click window,
                // so this cannot stop the navigation. In the browser the
                // hash route is what switches the filter.
                .on(EventKind::Click, move |event| {
                    event.prevent_default();
                    h.set_state(TodoPatch::filter(filter));
                })
                .child(filter.label()),
        )
    });

    let clear = (state.completed_count() > 0).then(|| {
        let h = handle.clone();
        Element::new("button")
            .class("clear-completed")
            .on(EventKind::Click, move |_| h.update(TodoState::clear_completed))
            .child("Clear completed")
    });

    Element::new("footer")
        .class("footer")
        .child(
            Element::new("span")
                .class("todo-count")
                .child(Element::new("strong").child(active.to_string()))
                .child(format!(" {} left", pluralize(active, "item"))),
        )
        .child(Element::new("ul").class("filters").children(filters))
        .child_opt(clear)
}

fn not_found() -> Node {
    Element::new("section")
        .class("todoapp")
        .child(Element::new("h2").child("404 - Page Not Found"))
        .child(Element::new("p").child("The page you are looking for does not exist."))
        .child(Element::new("a").attr("href", Filter::All.href()).child("Back to all todos"))
        .into()
}
