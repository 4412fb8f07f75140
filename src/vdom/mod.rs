//! Virtual display tree.
//!
//! Message values are type-erased inside the tree ([`AnyMsg`]) so subtrees
//! built for one message type can be embedded under another with
//! [`map_vnode`]. Application code works with the typed wrapper [`VNode<A>`].
//!
//! ```text
//! VNode<Child> ──map_vnode(f)──→ VNode<Parent>     (O(1): composes `cofn`)
//!                                     │
//!                       patch: push_down(cofn) into handlers and refs
//! ```

mod event;
mod map;
mod thunk;

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use serde_json::Value;

use crate::dom::{DomEvent, ElementId};
use crate::patch::Listener;

pub use event::{on_check, on_click, on_input, on_key};
pub use map::map_vnode;
pub(crate) use map::{push_down, Transform};
pub use thunk::{lazy, lazy2, lazy3, lazy_keyed, ThunkArg};
pub(crate) use thunk::{render_thunk, Thunk};

/// A message with its concrete type erased.
pub type AnyMsg = Box<dyn Any>;

/// Event handler stored in a node. `None` means "no message for this event".
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&DomEvent) -> Option<AnyMsg>>);

impl Handler {
    pub(crate) fn new(f: impl Fn(&DomEvent) -> Option<AnyMsg> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &DomEvent) -> Option<AnyMsg> {
        (self.0)(event)
    }

    fn piped(self, f: Transform) -> Self {
        Handler::new(move |event| self.call(event).map(|msg| f(msg)))
    }
}

type RefFn = Rc<dyn Fn(ElementId) -> Option<AnyMsg>>;

/// Lifecycle callbacks run when the realized element is created or removed.
#[derive(Clone, Default)]
pub struct ElemRef {
    pub(crate) created: Option<RefFn>,
    pub(crate) removed: Option<RefFn>,
}

impl ElemRef {
    pub fn created(&self, element: ElementId) -> Option<AnyMsg> {
        self.created.as_ref().and_then(|f| f(element))
    }

    pub fn removed(&self, element: ElementId) -> Option<AnyMsg> {
        self.removed.as_ref().and_then(|f| f(element))
    }

    fn piped(self, f: Transform) -> Self {
        let pipe = |cb: Option<RefFn>| -> Option<RefFn> {
            let f = Rc::clone(&f);
            cb.map(|cb| -> RefFn { Rc::new(move |el| cb(el).map(|msg| f(msg))) })
        };
        Self {
            created: pipe(self.created),
            removed: pipe(self.removed),
        }
    }
}

/// Data bag of one node.
#[derive(Clone, Default)]
pub struct NodeData {
    pub(crate) key: Option<String>,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) props: BTreeMap<String, Value>,
    pub(crate) class: BTreeMap<String, bool>,
    pub(crate) on: BTreeMap<String, Handler>,
    pub(crate) elem_ref: Option<ElemRef>,
    pub(crate) thunk: Option<Rc<Thunk>>,
    /// Transform still to be pushed into this subtree (or, for thunks, to be
    /// applied to whatever the render function returns).
    pub(crate) cofn: Option<Transform>,
    /// Live listener record owned by the patcher.
    pub(crate) listener: Option<Rc<Listener>>,
}

/// Untyped display tree node.
///
/// Elements carry a selector (`tag#id.class`); text nodes have no selector
/// and carry literal text.
#[derive(Clone, Default)]
pub struct Node {
    pub(crate) sel: Option<String>,
    pub(crate) data: NodeData,
    pub(crate) children: Vec<Node>,
    pub(crate) text: Option<String>,
    pub(crate) elm: Option<ElementId>,
}

impl Node {
    pub fn element(sel: impl Into<String>) -> Self {
        Self {
            sel: Some(sel.into()),
            ..Self::default()
        }
    }

    pub fn text_node(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn sel(&self) -> Option<&str> {
        self.sel.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.data.key.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Realized element, set once the node has been patched in.
    pub fn elm(&self) -> Option<ElementId> {
        self.elm
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.data.attrs
    }

    pub fn props(&self) -> &BTreeMap<String, Value> {
        &self.data.props
    }

    pub fn classes(&self) -> &BTreeMap<String, bool> {
        &self.data.class
    }

    pub fn handlers(&self) -> &BTreeMap<String, Handler> {
        &self.data.on
    }

    pub fn elem_ref(&self) -> Option<&ElemRef> {
        self.data.elem_ref.as_ref()
    }

    pub fn is_text(&self) -> bool {
        self.sel.is_none()
    }

    pub fn is_thunk(&self) -> bool {
        self.data.thunk.is_some()
    }

    /// Selector used to decide whether two nodes describe the same element.
    /// Thunks are matched by the selector they were declared with.
    pub(crate) fn match_sel(&self) -> Option<&str> {
        match &self.data.thunk {
            Some(thunk) => Some(thunk.sel.as_str()),
            None => self.sel.as_deref(),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.text {
            return f.debug_tuple("Text").field(text).finish();
        }
        f.debug_struct("Node")
            .field("sel", &self.sel)
            .field("key", &self.data.key)
            .field("elm", &self.elm)
            .field("thunk", &self.data.thunk.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Typed display tree whose handlers and refs emit messages of type `A`.
pub struct VNode<A> {
    node: Node,
    _msg: PhantomData<fn() -> A>,
}

impl<A> Clone for VNode<A> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl<A> fmt::Debug for VNode<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}

impl<A> VNode<A> {
    pub(crate) fn from_node(node: Node) -> Self {
        Self {
            node,
            _msg: PhantomData,
        }
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.node.data.key = Some(key.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.node.data.attrs.insert(name.into(), value.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.node.data.props.insert(name.into(), value.into());
        self
    }

    pub fn class(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.node.data.class.insert(name.into(), enabled);
        self
    }

    pub fn child(mut self, child: VNode<A>) -> Self {
        self.node.children.push(child.node);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode<A>>) -> Self {
        self.node
            .children
            .extend(children.into_iter().map(VNode::into_node));
        self
    }
}

impl<A: 'static> VNode<A> {
    /// Attach a handler for `event`; the handler returns `None` to emit nothing.
    pub fn on(mut self, event: impl Into<String>, f: impl Fn(&DomEvent) -> Option<A> + 'static) -> Self {
        let handler = Handler::new(move |ev| f(ev).map(|msg| Box::new(msg) as AnyMsg));
        self.node.data.on.insert(event.into(), handler);
        self
    }

    /// Run `f` with the realized element once it has been created.
    pub fn on_created(mut self, f: impl Fn(ElementId) -> Option<A> + 'static) -> Self {
        let elem_ref = self.node.data.elem_ref.get_or_insert_with(ElemRef::default);
        elem_ref.created = Some(Rc::new(move |el| f(el).map(|msg| Box::new(msg) as AnyMsg)));
        self
    }

    /// Run `f` with the realized element when it is removed.
    pub fn on_removed(mut self, f: impl Fn(ElementId) -> Option<A> + 'static) -> Self {
        let elem_ref = self.node.data.elem_ref.get_or_insert_with(ElemRef::default);
        elem_ref.removed = Some(Rc::new(move |el| f(el).map(|msg| Box::new(msg) as AnyMsg)));
        self
    }
}

/// Element with the given selector and children.
pub fn h<A>(sel: &str, children: impl IntoIterator<Item = VNode<A>>) -> VNode<A> {
    VNode::from_node(Node::element(sel)).children(children)
}

/// Literal text child.
pub fn text<A>(content: impl Into<String>) -> VNode<A> {
    VNode::from_node(Node::text_node(content))
}

/// Parsed `tag#id.class1.class2` selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selector<'a> {
    pub tag: &'a str,
    pub id: Option<&'a str>,
    pub classes: Vec<&'a str>,
}

impl<'a> Selector<'a> {
    pub fn parse(sel: &'a str) -> Self {
        let tag_end = sel.find(['#', '.']).unwrap_or(sel.len());
        let tag = if tag_end == 0 { "div" } else { &sel[..tag_end] };
        let rest = &sel[tag_end..];

        let mut id = None;
        let mut classes = Vec::new();
        let mut cursor = rest;
        while let Some(marker) = cursor.chars().next() {
            let body = &cursor[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            if !name.is_empty() {
                if marker == '#' {
                    id = Some(name);
                } else {
                    classes.push(name);
                }
            }
            cursor = &body[end..];
        }
        Self { tag, id, classes }
    }
}
