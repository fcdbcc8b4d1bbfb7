#![allow(dead_code)]

use host::{Document, HostHandle};
use reconciler::{Root, create_root};
use scheduler::Scheduler;

pub struct Harness {
    pub scheduler: Scheduler,
    pub root: Root<Document>,
    pub container: HostHandle,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_scheduler(Scheduler::new())
    }

    pub fn with_scheduler(scheduler: Scheduler) -> Self {
        let mut doc = Document::new();
        let container = doc.create_element("div").expect("container");
        let root = create_root(doc, container, &scheduler);
        Self {
            scheduler,
            root,
            container,
        }
    }

    pub fn html(&self) -> String {
        self.root.host().inner_html(self.container)
    }

    /// Clicks the `index`th button under the container.
    pub fn click_button(&self, index: usize) {
        let doc = self.root.host();
        let buttons = doc.query_selector_all(self.container, "button");
        let button = *buttons
            .get(index)
            .unwrap_or_else(|| panic!("no button #{index} in {}", doc.inner_html(self.container)));
        doc.click(button).expect("click");
    }

    /// Host nodes owned by fibers of the committed tree, excluding the
    /// container.
    pub fn fiber_host_nodes(&self) -> usize {
        self.root
            .current_tree()
            .iter()
            .filter(|f| f.depth > 0 && f.host.is_some())
            .count()
    }
}
