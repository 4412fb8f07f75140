//! Host display surface.
//!
//! The patcher never touches a concrete display tree; it drives a
//! [`DomHost`]. Realized elements are referred to by opaque [`ElementId`]s,
//! which virtual nodes keep as non-owning back-references.

mod memory;

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

pub use memory::{DomStats, MemoryDom};

/// Opaque handle to a realized element or text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An event raised by the host on a realized element.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    /// Event name, e.g. `click`, `input`, `keyup`.
    pub kind: String,
    pub target: ElementId,
    /// Current value of the target, for form controls.
    pub value: Option<String>,
    /// Key name for keyboard events (`Enter`, `Escape`, ...).
    pub key: Option<String>,
    /// Checked state for checkboxes.
    pub checked: Option<bool>,
}

impl DomEvent {
    pub fn new(kind: impl Into<String>, target: ElementId) -> Self {
        Self {
            kind: kind.into(),
            target,
            value: None,
            key: None,
            checked: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }
}

/// Receiver registered with the host for one element.
pub trait EventListener {
    fn handle_event(&self, event: &DomEvent);
}

/// Mutable display tree driven by the patcher.
///
/// `insert_before` with `reference = None` appends. Inserting a node that is
/// already attached moves it.
pub trait DomHost {
    fn create_element(&mut self, tag: &str) -> ElementId;

    fn create_text(&mut self, text: &str) -> ElementId;

    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>);

    fn remove_child(&mut self, parent: ElementId, child: ElementId);

    fn parent_node(&self, node: ElementId) -> Option<ElementId>;

    fn next_sibling(&self, node: ElementId) -> Option<ElementId>;

    /// Lower-case tag name, `None` for text nodes and unknown ids.
    fn tag_name(&self, node: ElementId) -> Option<String>;

    fn set_text(&mut self, node: ElementId, text: &str);

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);

    fn remove_attribute(&mut self, element: ElementId, name: &str);

    fn set_property(&mut self, element: ElementId, name: &str, value: &Value);

    fn remove_property(&mut self, element: ElementId, name: &str);

    fn set_class(&mut self, element: ElementId, name: &str, enabled: bool);

    fn add_listener(&mut self, element: ElementId, event: &str, listener: Rc<dyn EventListener>);

    fn remove_listener(&mut self, element: ElementId, event: &str);
}
