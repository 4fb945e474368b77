//! TodoMVC Example - Headless run against the in-memory document
//!
//! This example drives the todo app the way a browser would:
//! - Typing into the new-todo input and pressing Enter
//! - Toggling an item and double-clicking a label to edit it
//! - Following filter routes
//!
//! After each step it prints the rendered HTML and the DOM mutations the
//! reconciler made.
//!
//! Run with: cargo run --example todomvc

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use spark_dom::renderer::{click, key_down, toggle, type_text};
use spark_dom::todo::TodoApp;
use spark_dom::{Document, EventRegistry, ManualScheduler, MemoryDocument, Result, DOUBLE_CLICK_WINDOW};

fn main() -> Result<()> {
    let doc = Rc::new(RefCell::new(MemoryDocument::new()));
    let clock = ManualScheduler::new();
    let registry = EventRegistry::new(doc.clone(), Rc::new(clock.clone()));

    let container = {
        let mut d = doc.borrow_mut();
        let root = d.root();
        let container = d.create_element("div")?;
        d.set_attribute(container, "id", "app")?;
        d.append_child(root, container)?;
        container
    };

    println!("=== spark-dom TodoMVC Example ===\n");

    let app = TodoApp::new(registry, container);
    app.mount()?;
    snapshot(&doc, container, "mounted");

    for title in ["Buy milk", "Walk the dog", "Write docs"] {
        let input = find(&doc, "new-todo");
        type_text(&doc, input, title)?;
        key_down(&doc, input, "Enter");
    }
    snapshot(&doc, container, "added three todos");

    let first_toggle = find(&doc, "toggle");
    toggle(&doc, first_toggle)?;
    snapshot(&doc, container, "completed the first todo");

    // Two clicks inside the window make a double click
    let label = doc.borrow().query_tag("label")[2];
    click(&doc, label);
    clock.advance(Duration::from_millis(120));
    click(&doc, label);
    clock.advance(DOUBLE_CLICK_WINDOW);

    let edit = find(&doc, "edit");
    doc.borrow_mut().user_set_value(edit, "Walk the cat")?;
    key_down(&doc, edit, "Enter");
    snapshot(&doc, container, "renamed the second todo");

    app.navigate("#/active");
    snapshot(&doc, container, "#/active");

    app.navigate("#/nowhere");
    snapshot(&doc, container, "#/nowhere");

    println!("Renders: {}", app.manager().render_count());
    println!("Handlers: {}", app.manager().registry().handler_count());
    Ok(())
}

fn find(doc: &Rc<RefCell<MemoryDocument>>, class: &str) -> spark_dom::NodeId {
    doc.borrow()
        .find_class(class)
        .unwrap_or_else(|| panic!("no .{class} in the document"))
}

fn snapshot(doc: &Rc<RefCell<MemoryDocument>>, container: spark_dom::NodeId, step: &str) {
    let mut d = doc.borrow_mut();
    println!("--- {step} ---");
    println!("{}", d.to_html(container));
    println!("mutations: {:?}\n", d.stats());
    d.reset_stats();
}
