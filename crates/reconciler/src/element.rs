//! Element model: immutable descriptions of a tree node.
//!
//! Elements are cheap to clone (the props are shared) and are rebuilt on every
//! render. Text values are wrapped as `ElementType::Text` elements carrying a
//! single `nodeValue` prop.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use host::{EVENT_PREFIX, HostEvent, Listener, PropValue, StyleMap};

use crate::error::ComponentError;
use crate::hooks::Hooks;

/// Prop key holding a text element's content.
pub const TEXT_VALUE_KEY: &str = "nodeValue";

type RenderFn = dyn Fn(&mut Hooks<'_>, &Props) -> Result<Element, ComponentError>;

/// A function component.
///
/// Identity is the render allocation: clones of one `Component` match each
/// other, while two `Component::new` calls never match, even with the same
/// function or the same factory closure. Define a component once and clone it
/// into every element that uses it.
#[derive(Clone)]
pub struct Component {
    name: Arc<str>,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&mut Hooks<'_>, &Props) -> Result<Element, ComponentError> + 'static,
    {
        Self {
            name: Arc::from(name),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn same_type(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }

    /// Starts an element of this component; attributes and children become
    /// its props.
    pub fn element(&self) -> ElementBuilder {
        ElementBuilder::new(ElementType::Component(self.clone()))
    }

    pub(crate) fn render(
        &self,
        hooks: &mut Hooks<'_>,
        props: &Props,
    ) -> Result<Element, ComponentError> {
        (self.render)(hooks, props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

#[derive(Clone, Debug)]
pub enum ElementType {
    Host(Arc<str>),
    Text,
    Component(Component),
}

impl ElementType {
    pub fn same_type(&self, other: &ElementType) -> bool {
        match (self, other) {
            (ElementType::Host(a), ElementType::Host(b)) => a == b,
            (ElementType::Text, ElementType::Text) => true,
            (ElementType::Component(a), ElementType::Component(b)) => a.same_type(b),
            _ => false,
        }
    }
}

/// Ordered attributes plus children.
#[derive(Clone, Debug, Default)]
pub struct Props {
    attrs: Vec<(Arc<str>, PropValue)>,
    children: Vec<Element>,
}

impl Props {
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.attrs
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropValue::as_str)
    }

    pub fn num(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropValue::as_num)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(k, v)| (&**k, v))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    fn set(&mut self, key: &str, value: PropValue) {
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| &**k == key) {
            slot.1 = value;
        } else {
            self.attrs.push((Arc::from(key), value));
        }
    }
}

#[derive(Clone, Debug)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &Rc<Props> {
        &self.props
    }

    /// Root-fiber props: a single child and no attributes.
    pub(crate) fn root_props(element: Element) -> Rc<Props> {
        Rc::new(Props {
            attrs: Vec::new(),
            children: vec![element],
        })
    }
}

pub struct ElementBuilder {
    ty: ElementType,
    props: Props,
}

impl ElementBuilder {
    fn new(ty: ElementType) -> Self {
        Self {
            ty,
            props: Props::default(),
        }
    }

    /// Sets an attribute. Setting a key twice keeps the first position.
    pub fn attr(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.props.set(key, value.into());
        self
    }

    pub fn style(self, style: StyleMap) -> Self {
        self.attr("style", style)
    }

    /// Binds `handler` to `event` (`"click"` becomes the `onclick` prop).
    pub fn on(self, event: &str, handler: impl Fn(&HostEvent) + 'static) -> Self {
        self.listener(event, Listener::new(handler))
    }

    pub fn listener(self, event: &str, listener: Listener) -> Self {
        let key = format!("{EVENT_PREFIX}{event}");
        self.attr(&key, listener)
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.props.children.push(child.into());
        self
    }

    /// Appends every element of `children`, flattening the list into this
    /// element's child sequence.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        self.props
            .children
            .extend(children.into_iter().map(Into::<Element>::into));
        self
    }

    pub fn build(self) -> Element {
        Element {
            ty: self.ty,
            props: Rc::new(self.props),
        }
    }
}

/// Starts a host element.
pub fn h(tag: &str) -> ElementBuilder {
    ElementBuilder::new(ElementType::Host(Arc::from(tag)))
}

/// A text element.
pub fn text(value: impl fmt::Display) -> Element {
    let mut props = Props::default();
    props.set(TEXT_VALUE_KEY, PropValue::Str(value.to_string()));
    Element {
        ty: ElementType::Text,
        props: Rc::new(props),
    }
}

impl From<ElementBuilder> for Element {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        text(value)
    }
}

impl From<&String> for Element {
    fn from(value: &String) -> Self {
        text(value)
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        text(value)
    }
}

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        text(value)
    }
}

impl From<usize> for Element {
    fn from(value: usize) -> Self {
        text(value)
    }
}

impl From<f64> for Element {
    fn from(value: f64) -> Self {
        text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(_: &mut Hooks<'_>, _: &Props) -> Result<Element, ComponentError> {
        Ok(h("p").build())
    }

    fn other(_: &mut Hooks<'_>, _: &Props) -> Result<Element, ComponentError> {
        Ok(h("p").build())
    }

    #[test]
    fn text_values_are_wrapped() {
        let el = h("div").child("hello").child(3).build();
        let children = el.props().children();
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0].ty(), ElementType::Text));
        assert_eq!(children[0].props().str(TEXT_VALUE_KEY), Some("hello"));
        assert_eq!(children[1].props().str(TEXT_VALUE_KEY), Some("3"));
    }

    #[test]
    fn nested_lists_flatten_into_children() {
        let items = (0..3).map(|i| h("li").child(i));
        let el = h("ul").child("head").children(items).child("tail").build();
        assert_eq!(el.props().children().len(), 5);
    }

    fn labelled(name: &'static str) -> Component {
        Component::new(name, move |_, _| Ok(h("p").child(name).build()))
    }

    #[test]
    fn component_identity_follows_the_render_allocation() {
        let a = Component::new("Leaf", leaf);
        let b = Component::new("Leaf", leaf);
        let c = Component::new("Other", other);
        assert!(a.same_type(&a.clone()));
        assert!(!a.same_type(&b));
        assert!(!a.same_type(&c));
        assert!(!labelled("Alpha").same_type(&labelled("Beta")));
        assert!(
            ElementType::Host(Arc::from("div")).same_type(&ElementType::Host(Arc::from("div")))
        );
        assert!(!ElementType::Host(Arc::from("div")).same_type(&ElementType::Text));
    }

    #[test]
    fn listeners_use_event_prefix() {
        let el = h("button").on("click", |_| {}).build();
        let (key, value) = el.props().attrs().next().expect("listener prop");
        assert_eq!(key, "onclick");
        assert!(value.as_listener().is_some());
    }
}
