//! In-memory host tree.
//!
//! An arena of element and text nodes addressed by `HostHandle`. Handles are
//! allocated sequentially starting at 1 and never reused. Detached nodes stay
//! in the arena until released; a released handle is unknown from then on.

use core_types::HostHandle;
use std::sync::Arc;

use crate::adapter::{HostAdapter, HostError};
use crate::mutation::HostMutation;
use crate::serialize;
use crate::style;
use crate::value::{HostEvent, Listener, PropValue};

#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<Option<NodeRecord>>,
    live: usize,
    recording: bool,
    mutations: Vec<HostMutation>,
}

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<HostHandle>,
    children: Vec<HostHandle>,
    listeners: Vec<(Arc<str>, Listener)>,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Element {
        tag: Arc<str>,
        attributes: Vec<(Arc<str>, String)>,
        style: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached element, typically used as a render container.
    pub fn create_element(&mut self, tag: &str) -> Result<HostHandle, HostError> {
        validate_tag(tag)?;
        let tag: Arc<str> = Arc::from(tag.to_ascii_lowercase());
        let node = self.insert(NodeKind::Element {
            tag: Arc::clone(&tag),
            attributes: Vec::new(),
            style: Vec::new(),
        });
        self.record(HostMutation::CreateElement { node, tag });
        Ok(node)
    }

    /// Starts (or stops) recording applied primitives.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    pub fn take_mutations(&mut self) -> Vec<HostMutation> {
        std::mem::take(&mut self.mutations)
    }

    /// Nodes not yet released, attached or not.
    pub fn node_count(&self) -> usize {
        self.live
    }

    pub fn tag(&self, node: HostHandle) -> Option<&str> {
        match &self.record_of(node).ok()?.kind {
            NodeKind::Element { tag, .. } => Some(&**tag),
            NodeKind::Text { .. } => None,
        }
    }

    pub fn text(&self, node: HostHandle) -> Option<&str> {
        match &self.record_of(node).ok()?.kind {
            NodeKind::Text { text } => Some(text.as_str()),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn attribute(&self, node: HostHandle, name: &str) -> Option<&str> {
        match &self.record_of(node).ok()?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| &**k == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text { .. } => None,
        }
    }

    /// Formatted style declarations, in assignment order.
    pub fn style(&self, node: HostHandle) -> &[(String, String)] {
        match self.record_of(node).map(|r| &r.kind) {
            Ok(NodeKind::Element { style, .. }) => style.as_slice(),
            _ => &[],
        }
    }

    pub fn parent(&self, node: HostHandle) -> Option<HostHandle> {
        self.record_of(node).ok()?.parent
    }

    pub fn children(&self, node: HostHandle) -> &[HostHandle] {
        match self.record_of(node) {
            Ok(record) => record.children.as_slice(),
            Err(_) => &[],
        }
    }

    pub fn listener_count(&self, node: HostHandle) -> usize {
        self.record_of(node).map(|r| r.listeners.len()).unwrap_or(0)
    }

    /// Number of nodes below `root`, excluding `root` itself.
    pub fn attached_count(&self, root: HostHandle) -> usize {
        let mut count = 0;
        let mut stack: Vec<HostHandle> = self.children(root).to_vec();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(self.children(node).iter().copied());
        }
        count
    }

    /// Elements below `root` with the given tag, in document order.
    pub fn query_selector_all(&self, root: HostHandle, tag: &str) -> Vec<HostHandle> {
        let mut out = Vec::new();
        self.collect_by_tag(root, tag, &mut out);
        out
    }

    fn collect_by_tag(&self, node: HostHandle, tag: &str, out: &mut Vec<HostHandle>) {
        for &child in self.children(node) {
            if self
                .tag(child)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag))
            {
                out.push(child);
            }
            self.collect_by_tag(child, tag, out);
        }
    }

    pub fn text_content(&self, node: HostHandle) -> String {
        let mut out = String::new();
        self.push_text(node, &mut out);
        out
    }

    fn push_text(&self, node: HostHandle, out: &mut String) {
        if let Some(text) = self.text(node) {
            out.push_str(text);
            return;
        }
        for &child in self.children(node) {
            self.push_text(child, out);
        }
    }

    pub fn inner_html(&self, node: HostHandle) -> String {
        serialize::inner_html(self, node)
    }

    pub fn outer_html(&self, node: HostHandle) -> String {
        serialize::outer_html(self, node)
    }

    /// Invokes the listeners bound for `event` on `node`, in binding order.
    ///
    /// Returns the number of listeners invoked. Events do not bubble.
    pub fn dispatch_event(&self, node: HostHandle, event: &str) -> Result<usize, HostError> {
        let record = self.record_of(node)?;
        let listeners: Vec<Listener> = record
            .listeners
            .iter()
            .filter(|(name, _)| &**name == event)
            .map(|(_, l)| l.clone())
            .collect();
        let payload = HostEvent {
            name: event.to_string(),
            target: node,
        };
        for listener in &listeners {
            listener.call(&payload);
        }
        Ok(listeners.len())
    }

    pub fn click(&self, node: HostHandle) -> Result<usize, HostError> {
        self.dispatch_event(node, "click")
    }

    pub(crate) fn kind(&self, node: HostHandle) -> Option<&NodeKind> {
        self.record_of(node).ok().map(|r| &r.kind)
    }

    fn insert(&mut self, kind: NodeKind) -> HostHandle {
        self.nodes.push(Some(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }));
        self.live += 1;
        HostHandle(self.nodes.len() as u32)
    }

    fn record(&mut self, mutation: HostMutation) {
        log::trace!(target: "host.document", "apply: {mutation:?}");
        if self.recording {
            self.mutations.push(mutation);
        }
    }

    fn index_of(&self, node: HostHandle) -> Result<usize, HostError> {
        let index = (node.0 as usize).wrapping_sub(1);
        if node.is_valid() && self.nodes.get(index).is_some_and(Option::is_some) {
            Ok(index)
        } else {
            Err(HostError::UnknownNode(node))
        }
    }

    fn record_of(&self, node: HostHandle) -> Result<&NodeRecord, HostError> {
        let index = self.index_of(node)?;
        self.nodes[index]
            .as_ref()
            .ok_or(HostError::UnknownNode(node))
    }

    fn record_mut(&mut self, node: HostHandle) -> Result<&mut NodeRecord, HostError> {
        let index = self.index_of(node)?;
        self.nodes[index]
            .as_mut()
            .ok_or(HostError::UnknownNode(node))
    }

    fn is_descendant(&self, ancestor: HostHandle, maybe_descendant: HostHandle) -> bool {
        let mut stack: Vec<HostHandle> = self.children(ancestor).to_vec();
        while let Some(current) = stack.pop() {
            if current == maybe_descendant {
                return true;
            }
            stack.extend(self.children(current).iter().copied());
        }
        false
    }
}

fn validate_tag(tag: &str) -> Result<(), HostError> {
    let valid = !tag.is_empty()
        && tag.starts_with(|c: char| c.is_ascii_alphabetic())
        && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(HostError::InvalidTag(tag.to_string()))
    }
}

/// DOM property name -> attribute name.
fn attribute_name(key: &str) -> &str {
    match key {
        "className" => "class",
        "htmlFor" => "for",
        _ => key,
    }
}

fn set_attribute(attributes: &mut Vec<(Arc<str>, String)>, name: &str, value: String) {
    if let Some(slot) = attributes.iter_mut().find(|(k, _)| &**k == name) {
        slot.1 = value;
    } else {
        attributes.push((Arc::from(name), value));
    }
}

fn remove_attribute(attributes: &mut Vec<(Arc<str>, String)>, name: &str) {
    attributes.retain(|(k, _)| &**k != name);
}

impl HostAdapter for Document {
    fn create_node(&mut self, tag: &str) -> Result<HostHandle, HostError> {
        self.create_element(tag)
    }

    fn create_text_node(&mut self) -> Result<HostHandle, HostError> {
        let node = self.insert(NodeKind::Text {
            text: String::new(),
        });
        self.record(HostMutation::CreateText { node });
        Ok(node)
    }

    fn set_property(
        &mut self,
        node: HostHandle,
        key: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        let record = self.record_mut(node)?;
        match &mut record.kind {
            NodeKind::Text { text } => {
                if key != "nodeValue" {
                    return Err(HostError::WrongNodeKind {
                        node,
                        expected: "element",
                    });
                }
                *text = match value {
                    PropValue::Str(s) => s.clone(),
                    PropValue::Num(n) => style::format_number(*n),
                    PropValue::Bool(b) => b.to_string(),
                    other => {
                        return Err(HostError::UnsupportedValue {
                            key: key.to_string(),
                            kind: other.kind_name(),
                        });
                    }
                };
            }
            NodeKind::Element {
                attributes,
                style: declarations,
                ..
            } => {
                let name = attribute_name(key);
                match value {
                    PropValue::Str(s) if name == "style" => {
                        declarations.clear();
                        set_attribute(attributes, name, s.clone());
                    }
                    PropValue::Str(s) => set_attribute(attributes, name, s.clone()),
                    PropValue::Num(n) => set_attribute(attributes, name, style::format_number(*n)),
                    PropValue::Bool(true) => set_attribute(attributes, name, String::new()),
                    PropValue::Bool(false) => remove_attribute(attributes, name),
                    PropValue::Style(map) => {
                        *declarations = style::declarations(map);
                        if declarations.is_empty() {
                            remove_attribute(attributes, name);
                        } else {
                            set_attribute(attributes, name, style::css_text(declarations));
                        }
                    }
                    PropValue::Listener(_) => {
                        return Err(HostError::UnsupportedValue {
                            key: key.to_string(),
                            kind: value.kind_name(),
                        });
                    }
                }
            }
        }
        self.record(HostMutation::SetProperty {
            node,
            key: Arc::from(key),
            value: value.clone(),
        });
        Ok(())
    }

    fn remove_property(&mut self, node: HostHandle, key: &str) -> Result<(), HostError> {
        let record = self.record_mut(node)?;
        match &mut record.kind {
            NodeKind::Text { text } => {
                if key == "nodeValue" {
                    text.clear();
                }
            }
            NodeKind::Element {
                attributes, style, ..
            } => {
                let name = attribute_name(key);
                if name == "style" {
                    style.clear();
                }
                remove_attribute(attributes, name);
            }
        }
        self.record(HostMutation::RemoveProperty {
            node,
            key: Arc::from(key),
        });
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: HostHandle,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        let event: Arc<str> = Arc::from(event);
        let record = self.record_mut(node)?;
        record.listeners.push((Arc::clone(&event), listener.clone()));
        self.record(HostMutation::AddListener { node, event });
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: HostHandle,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        let record = self.record_mut(node)?;
        if let Some(pos) = record
            .listeners
            .iter()
            .position(|(name, l)| &**name == event && l.ptr_eq(listener))
        {
            record.listeners.remove(pos);
        }
        self.record(HostMutation::RemoveListener {
            node,
            event: Arc::from(event),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<(), HostError> {
        let allows_children = self.record_of(parent)?.allows_children();
        let attached = self.record_of(child)?.parent.is_some();
        if parent == child || self.is_descendant(child, parent) {
            debug_assert!(false, "cannot create cycle");
            return Err(HostError::CycleDetected { parent, child });
        }
        if !allows_children {
            return Err(HostError::InvalidParent(parent));
        }
        if attached {
            return Err(HostError::AlreadyAttached(child));
        }
        self.record_mut(parent)?.children.push(child);
        self.record_mut(child)?.parent = Some(parent);
        self.record(HostMutation::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<(), HostError> {
        self.record_of(parent)?;
        if self.record_of(child)?.parent != Some(parent) {
            return Err(HostError::NotAChild { parent, child });
        }
        self.record_mut(parent)?.children.retain(|c| *c != child);
        self.record_mut(child)?.parent = None;
        self.record(HostMutation::RemoveChild { parent, child });
        Ok(())
    }

    fn release_node(&mut self, node: HostHandle) -> Result<(), HostError> {
        if self.record_of(node)?.parent.is_some() {
            return Err(HostError::AlreadyAttached(node));
        }
        let mut released = 0usize;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Ok(index) = self.index_of(current) else {
                continue;
            };
            if let Some(record) = self.nodes[index].take() {
                stack.extend(record.children);
                released += 1;
            }
        }
        self.live -= released;
        self.record(HostMutation::ReleaseNode { node });
        Ok(())
    }

    fn contains(&self, parent: HostHandle, node: HostHandle) -> bool {
        if self.index_of(parent).is_err() || self.index_of(node).is_err() {
            return false;
        }
        parent == node || self.is_descendant(parent, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::StyleMap;
    use std::cell::Cell;
    use std::rc::Rc;

    fn doc_with_container() -> (Document, HostHandle) {
        let mut doc = Document::new();
        let container = doc.create_element("div").expect("container");
        (doc, container)
    }

    #[test]
    fn properties_map_to_attributes_in_assignment_order() {
        let (mut doc, container) = doc_with_container();
        let div = doc.create_node("div").expect("div");
        doc.set_property(div, "id", &"foo".into()).expect("id");
        doc.set_property(div, "className", &"foo-class".into())
            .expect("class");
        doc.append_child(container, div).expect("append");
        assert_eq!(
            doc.inner_html(container),
            r#"<div id="foo" class="foo-class"></div>"#
        );

        doc.remove_property(div, "id").expect("remove");
        assert_eq!(doc.inner_html(container), r#"<div class="foo-class"></div>"#);
    }

    #[test]
    fn style_objects_are_formatted() {
        let (mut doc, container) = doc_with_container();
        let div = doc.create_node("div").expect("div");
        let style = StyleMap::new().with("width", 100).with("fontSize", "22px");
        doc.set_property(div, "style", &style.into()).expect("style");
        doc.append_child(container, div).expect("append");
        assert_eq!(
            doc.inner_html(container),
            r#"<div style="width: 100px; font-size: 22px;"></div>"#
        );
        assert_eq!(doc.style(div).len(), 2);
    }

    #[test]
    fn text_nodes_take_node_value() {
        let (mut doc, container) = doc_with_container();
        let text = doc.create_text_node().expect("text");
        doc.set_property(text, "nodeValue", &PropValue::Num(3.0))
            .expect("text");
        doc.append_child(container, text).expect("append");
        assert_eq!(doc.inner_html(container), "3");
        assert!(matches!(
            doc.set_property(text, "id", &"x".into()),
            Err(HostError::WrongNodeKind { .. })
        ));
    }

    #[test]
    fn append_rejects_cycles_and_double_parents() {
        let (mut doc, container) = doc_with_container();
        let a = doc.create_node("div").expect("a");
        let b = doc.create_node("div").expect("b");
        doc.append_child(container, a).expect("append a");
        doc.append_child(a, b).expect("append b");
        assert_eq!(
            doc.append_child(container, b),
            Err(HostError::AlreadyAttached(b))
        );
        assert!(doc.contains(container, b));
        assert!(!doc.contains(b, container));
    }

    #[test]
    fn remove_child_detaches_subtree() {
        let (mut doc, container) = doc_with_container();
        let a = doc.create_node("ul").expect("ul");
        let b = doc.create_node("li").expect("li");
        doc.append_child(a, b).expect("append li");
        doc.append_child(container, a).expect("append ul");
        assert_eq!(doc.attached_count(container), 2);
        doc.remove_child(container, a).expect("remove");
        assert_eq!(doc.attached_count(container), 0);
        assert_eq!(
            doc.remove_child(container, a),
            Err(HostError::NotAChild {
                parent: container,
                child: a
            })
        );
    }

    #[test]
    fn listeners_fire_until_removed() {
        let (mut doc, _) = doc_with_container();
        let button = doc.create_node("button").expect("button");
        let hits = Rc::new(Cell::new(0));
        let listener = {
            let hits = Rc::clone(&hits);
            Listener::new(move |_| hits.set(hits.get() + 1))
        };
        doc.add_listener(button, "click", &listener).expect("add");
        assert_eq!(doc.click(button), Ok(1));
        doc.remove_listener(button, "click", &listener)
            .expect("remove");
        assert_eq!(doc.click(button), Ok(0));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn mutations_are_logged_only_while_recording() {
        let (mut doc, container) = doc_with_container();
        let a = doc.create_node("p").expect("p");
        doc.set_recording(true);
        doc.append_child(container, a).expect("append");
        let log = doc.take_mutations();
        assert_eq!(
            log,
            vec![HostMutation::AppendChild {
                parent: container,
                child: a
            }]
        );
        assert!(log[0].is_structural());
    }

    #[test]
    fn released_subtrees_leave_the_arena() {
        let (mut doc, container) = doc_with_container();
        let ul = doc.create_node("ul").expect("ul");
        let li = doc.create_node("li").expect("li");
        doc.append_child(ul, li).expect("append li");
        doc.append_child(container, ul).expect("append ul");
        assert_eq!(doc.node_count(), 3);
        assert_eq!(doc.parent(li), Some(ul));

        assert_eq!(doc.release_node(ul), Err(HostError::AlreadyAttached(ul)));
        doc.remove_child(container, ul).expect("remove");
        doc.release_node(ul).expect("release");
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.parent(li), None);
        assert_eq!(doc.tag(li), None);
        assert_eq!(doc.append_child(container, li), Err(HostError::UnknownNode(li)));

        // Handles are not reused after a release.
        let next = doc.create_node("p").expect("p");
        assert!(next.0 > li.0);
    }

    #[test]
    fn invalid_tags_fail_fast() {
        let mut doc = Document::new();
        assert_eq!(
            doc.create_node(""),
            Err(HostError::InvalidTag(String::new()))
        );
        assert!(doc.create_node("my-widget").is_ok());
    }
}
