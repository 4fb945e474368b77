//! TodoMVC driven through the in-memory document and a manual clock.
//!
//! Every interaction goes through native-event simulation: root listeners,
//! delegated dispatch, the click state machine and the render manager.
//!
//! Run with: cargo test --test todomvc

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use spark_dom::renderer::{click, key_down, toggle, type_text};
use spark_dom::todo::{Filter, TodoApp, TodoState};
use spark_dom::{
    Document, EventKind, EventRegistry, ManualScheduler, MemoryDocument, NodeId,
    DOUBLE_CLICK_WINDOW,
};

// =============================================================================
// HARNESS
// =============================================================================

struct Harness {
    doc: Rc<RefCell<MemoryDocument>>,
    clock: ManualScheduler,
    app: TodoApp<MemoryDocument>,
}

fn setup() -> Harness {
    let doc = Rc::new(RefCell::new(MemoryDocument::new()));
    let clock = ManualScheduler::new();
    let registry = EventRegistry::new(doc.clone(), Rc::new(clock.clone()));
    let container = {
        let mut d = doc.borrow_mut();
        let root = d.root();
        let container = d.create_element("div").unwrap();
        d.set_attribute(container, "id", "app").unwrap();
        d.append_child(root, container).unwrap();
        container
    };
    let app = TodoApp::new(registry, container);
    app.mount().unwrap();
    Harness { doc, clock, app }
}

impl Harness {
    fn find(&self, class: &str) -> NodeId {
        self.doc
            .borrow()
            .find_class(class)
            .unwrap_or_else(|| panic!("no element with class {class}"))
    }

    fn all(&self, class: &str) -> Vec<NodeId> {
        self.doc.borrow().query_class(class)
    }

    fn text(&self, node: NodeId) -> String {
        self.doc.borrow().text_content(node)
    }

    fn items(&self) -> Vec<NodeId> {
        let list = self.find("todo-list");
        self.doc.borrow().children(list)
    }

    fn titles(&self) -> Vec<String> {
        self.items().into_iter().map(|li| self.text(li)).collect()
    }

    fn add(&self, title: &str) {
        let input = self.find("new-todo");
        type_text(&self.doc, input, title).unwrap();
        key_down(&self.doc, input, "Enter");
    }

    /// A single click, settled past the double-click window.
    fn click(&self, node: NodeId) {
        click(&self.doc, node);
        self.clock.advance(DOUBLE_CLICK_WINDOW);
    }

    fn double_click(&self, node: NodeId) {
        click(&self.doc, node);
        self.clock.advance(Duration::from_millis(100));
        click(&self.doc, node);
        self.clock.advance(DOUBLE_CLICK_WINDOW);
    }

    /// The title label inside `li` (`li > div.view > label`).
    fn label_of(&self, li: NodeId) -> NodeId {
        let doc = self.doc.borrow();
        doc.query_tag("label")
            .into_iter()
            .find(|label| doc.parent(*label).and_then(|view| doc.parent(view)) == Some(li))
            .unwrap()
    }

    fn state(&self) -> TodoState {
        self.app.state()
    }
}

// =============================================================================
// ADDING AND COUNTING
// =============================================================================

#[test]
fn test_empty_app_hides_main_and_footer() {
    let h = setup();
    assert!(h.all("main").is_empty());
    assert!(h.all("footer").is_empty());
    assert_eq!(h.text(h.find("header")), "todos");
}

#[test]
fn test_add_todos_and_count() {
    let h = setup();
    h.add("Buy milk");
    assert_eq!(h.titles(), vec!["Buy milk"]);
    assert_eq!(h.text(h.find("todo-count")), "1 item left");

    h.add("  Walk dog  ");
    assert_eq!(h.titles(), vec!["Buy milk", "Walk dog"]);
    assert_eq!(h.text(h.find("todo-count")), "2 items left");

    let input = h.find("new-todo");
    assert_eq!(h.doc.borrow().value(input).as_deref(), Some(""));
}

#[test]
fn test_blank_input_adds_nothing() {
    let h = setup();
    h.add("   ");
    assert!(h.state().todos.is_empty());
    assert!(h.all("todo-list").is_empty());
}

#[test]
fn test_typing_does_not_rewrite_value() {
    let h = setup();
    let input = h.find("new-todo");
    h.doc.borrow_mut().reset_stats();

    type_text(&h.doc, input, "draft").unwrap();

    assert_eq!(h.state().input, "draft");
    assert_eq!(h.doc.borrow().stats().value_writes, 0);
    assert_eq!(h.doc.borrow().value(input).as_deref(), Some("draft"));
}

// =============================================================================
// TOGGLING, REMOVING, CLEARING
// =============================================================================

#[test]
fn test_toggle_marks_item_completed() {
    let h = setup();
    h.add("a");
    h.add("b");
    let first = h.items()[0];

    toggle(&h.doc, h.all("toggle")[0]).unwrap();

    assert_eq!(h.doc.borrow().attribute(first, "class").as_deref(), Some("completed"));
    assert_eq!(h.items()[0], first);
    assert_eq!(h.text(h.find("todo-count")), "1 item left");
    assert_eq!(h.text(h.find("clear-completed")), "Clear completed");
}

#[test]
fn test_toggle_all_round_trip() {
    let h = setup();
    h.add("a");
    h.add("b");

    toggle(&h.doc, h.find("toggle-all")).unwrap();
    assert!(h.state().all_completed());
    assert_eq!(h.doc.borrow().checked(h.find("toggle-all")), Some(true));

    toggle(&h.doc, h.find("toggle-all")).unwrap();
    assert_eq!(h.state().active_count(), 2);
    assert_eq!(h.doc.borrow().checked(h.find("toggle-all")), Some(false));
}

#[test]
fn test_destroy_removes_only_that_item() {
    let h = setup();
    h.add("a");
    h.add("b");
    h.add("c");
    let before = h.items();

    h.click(h.all("destroy")[1]);

    assert_eq!(h.titles(), vec!["a", "c"]);
    assert_eq!(h.items(), vec![before[0], before[2]]);
}

#[test]
fn test_clear_completed() {
    let h = setup();
    h.add("a");
    h.add("b");
    toggle(&h.doc, h.all("toggle")[0]).unwrap();

    h.click(h.find("clear-completed"));

    assert_eq!(h.titles(), vec!["b"]);
    assert!(h.all("clear-completed").is_empty());
}

#[test]
fn test_removing_last_item_hides_sections() {
    let h = setup();
    h.add("only");
    h.click(h.find("destroy"));
    assert!(h.all("main").is_empty());
    assert!(h.all("footer").is_empty());
}

// =============================================================================
// EDITING
// =============================================================================

#[test]
fn test_double_click_label_starts_editing() {
    let h = setup();
    h.add("a");
    let li = h.items()[0];

    h.double_click(h.label_of(li));

    assert_eq!(h.state().editing, Some(1));
    assert_eq!(h.doc.borrow().attribute(li, "class").as_deref(), Some("editing"));
    let edit = h.find("edit");
    assert_eq!(h.doc.borrow().value(edit).as_deref(), Some("a"));
}

#[test]
fn test_slow_clicks_on_label_do_not_edit() {
    let h = setup();
    h.add("a");
    let label = h.label_of(h.items()[0]);

    h.click(label);
    h.clock.advance(Duration::from_millis(100));
    h.click(label);

    assert_eq!(h.state().editing, None);
}

#[test]
fn test_edit_enter_saves_trimmed_title() {
    let h = setup();
    h.add("a");
    h.double_click(h.label_of(h.items()[0]));

    let edit = h.find("edit");
    h.doc.borrow_mut().user_set_value(edit, "  renamed ").unwrap();
    key_down(&h.doc, edit, "Enter");

    assert_eq!(h.titles(), vec!["renamed"]);
    assert_eq!(h.state().editing, None);
    assert!(h.all("edit").is_empty());
}

#[test]
fn test_edit_enter_with_blank_removes() {
    let h = setup();
    h.add("a");
    h.add("b");
    h.double_click(h.label_of(h.items()[0]));

    let edit = h.find("edit");
    h.doc.borrow_mut().user_set_value(edit, "").unwrap();
    key_down(&h.doc, edit, "Enter");

    assert_eq!(h.titles(), vec!["b"]);
}

#[test]
fn test_edit_escape_cancels() {
    let h = setup();
    h.add("a");
    h.double_click(h.label_of(h.items()[0]));

    let edit = h.find("edit");
    h.doc.borrow_mut().user_set_value(edit, "changed").unwrap();
    key_down(&h.doc, edit, "Escape");

    assert_eq!(h.titles(), vec!["a"]);
    assert_eq!(h.state().editing, None);
}

// =============================================================================
// FILTERS AND ROUTES
// =============================================================================

#[test]
fn test_filter_links_set_filter() {
    let h = setup();
    h.add("a");
    h.add("b");
    toggle(&h.doc, h.all("toggle")[0]).unwrap();

    let links = h.doc.borrow().query_tag("a");
    // The click waits out the double-click window, so the native event has
    // already finished when the handler runs.
    let prevented = click(&h.doc, links[1]);
    assert!(!prevented);
    h.clock.advance(DOUBLE_CLICK_WINDOW);

    assert_eq!(h.state().filter, Filter::Active);
    assert_eq!(h.titles(), vec!["b"]);
    assert_eq!(h.doc.borrow().attribute(links[1], "class").as_deref(), Some("selected"));
}

#[test]
fn test_routes_set_filter() {
    let h = setup();
    h.add("a");
    h.add("b");
    toggle(&h.doc, h.all("toggle")[1]).unwrap();

    assert!(h.app.navigate("#/completed"));
    assert_eq!(h.titles(), vec!["b"]);
    assert!(h.app.navigate("#/active"));
    assert_eq!(h.titles(), vec!["a"]);
    assert!(h.app.navigate(""));
    assert_eq!(h.titles(), vec!["a", "b"]);
    assert_eq!(h.app.router().current().as_deref(), Some("/"));
}

#[test]
fn test_unknown_route_renders_not_found_and_recovers() {
    let h = setup();
    h.add("a");

    h.app.navigate("#/nowhere");
    let root = h.doc.borrow().root();
    assert!(h.text(root).contains("404 - Page Not Found"));
    assert!(h.all("todo-list").is_empty());

    h.app.navigate("#/");
    assert_eq!(h.titles(), vec!["a"]);
}

// =============================================================================
// RECONCILIATION PROPERTIES
// =============================================================================

#[test]
fn test_rerender_with_same_state_writes_nothing() {
    let h = setup();
    h.add("a");
    h.add("b");
    h.doc.borrow_mut().reset_stats();

    h.app.manager().update(|_| {}).unwrap();

    assert!(h.doc.borrow().stats().is_empty());
}

#[test]
fn test_handlers_do_not_accumulate() {
    let h = setup();
    h.add("a");
    h.add("b");
    let registry = h.app.manager().registry().clone();
    let baseline = registry.handler_count();

    for _ in 0..5 {
        h.app.manager().update(|_| {}).unwrap();
    }
    h.click(h.all("destroy")[0]);
    h.add("c");

    assert_eq!(registry.handler_count(), baseline);
    assert!(registry.is_registered(EventKind::KeyDown, "new-todo-keydown"));
}
