//! Attribute, property and class modules.

use std::collections::BTreeMap;

use super::{Module, PatchContext};
use crate::dom::ElementId;
use crate::vdom::Node;

/// Diff two maps: `apply(name, Some(value))` for new or changed entries,
/// `apply(name, None)` for entries that disappeared.
fn reconcile<V: PartialEq>(
    old: &BTreeMap<String, V>,
    new: &BTreeMap<String, V>,
    mut apply: impl FnMut(&str, Option<&V>),
) {
    for name in old.keys() {
        if !new.contains_key(name) {
            apply(name, None);
        }
    }
    for (name, value) in new {
        if old.get(name) != Some(value) {
            apply(name, Some(value));
        }
    }
}

pub struct AttrsModule;

impl Module for AttrsModule {
    fn create(&self, cx: &mut PatchContext<'_>, node: &mut Node) {
        let Some(elm) = node.elm else { return };
        for (name, value) in node.attrs() {
            cx.host.set_attribute(elm, name, value);
        }
    }

    fn update(&self, cx: &mut PatchContext<'_>, old: &mut Node, new: &mut Node) {
        let Some(elm) = new.elm else { return };
        reconcile(old.attrs(), new.attrs(), |name, value| match value {
            Some(value) => cx.host.set_attribute(elm, name, value),
            None => cx.host.remove_attribute(elm, name),
        });
    }
}

pub struct PropsModule;

impl Module for PropsModule {
    fn create(&self, cx: &mut PatchContext<'_>, node: &mut Node) {
        let Some(elm) = node.elm else { return };
        for (name, value) in node.props() {
            cx.host.set_property(elm, name, value);
        }
    }

    fn update(&self, cx: &mut PatchContext<'_>, old: &mut Node, new: &mut Node) {
        let Some(elm) = new.elm else { return };
        reconcile(old.props(), new.props(), |name, value| match value {
            Some(value) => cx.host.set_property(elm, name, value),
            None => cx.host.remove_property(elm, name),
        });
    }
}

/// Toggles classes from the node's class map. Classes from the selector are
/// set at creation and left alone unless the map names them.
pub struct ClassModule;

impl ClassModule {
    fn apply(cx: &mut PatchContext<'_>, elm: ElementId, old: &BTreeMap<String, bool>, new: &BTreeMap<String, bool>) {
        reconcile(old, new, |name, enabled| {
            cx.host.set_class(elm, name, enabled.copied().unwrap_or(false))
        });
    }
}

impl Module for ClassModule {
    fn create(&self, cx: &mut PatchContext<'_>, node: &mut Node) {
        let Some(elm) = node.elm else { return };
        Self::apply(cx, elm, &BTreeMap::new(), node.classes());
    }

    fn update(&self, cx: &mut PatchContext<'_>, old: &mut Node, new: &mut Node) {
        let Some(elm) = new.elm else { return };
        Self::apply(cx, elm, old.classes(), new.classes());
    }
}
