//! Event listener reconciliation.
//!
//! Each element with handlers gets one [`Listener`] registered with the host
//! for every event name it handles. The record is carried from the old node
//! to the new one on update, so a handler that merely changed is swapped in
//! place without touching the host.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{Emit, Module, PatchContext};
use crate::dom::{DomEvent, EventListener};
use crate::vdom::{Handler, Node};

pub(crate) struct Listener {
    handlers: RefCell<BTreeMap<String, Handler>>,
    emit: Emit,
}

impl Listener {
    fn new(emit: Emit) -> Self {
        Self {
            handlers: RefCell::new(BTreeMap::new()),
            emit,
        }
    }

    fn has(&self, event: &str) -> bool {
        self.handlers.borrow().contains_key(event)
    }
}

impl EventListener for Listener {
    fn handle_event(&self, event: &DomEvent) {
        // Emitting may re-patch this very element; release the map first.
        let handler = self.handlers.borrow().get(&event.kind).cloned();
        let Some(handler) = handler else {
            tracing::debug!(event = %event.kind, target = %event.target, "no handler for event");
            return;
        };
        if let Some(msg) = handler.call(event) {
            (self.emit)(msg);
        }
    }
}

pub struct ListenerModule;

impl ListenerModule {
    fn reconcile(cx: &mut PatchContext<'_>, old: Option<&mut Node>, new: Option<&mut Node>) {
        let empty = BTreeMap::new();
        let (old_on, old_listener, old_elm) = match old {
            Some(old) => (&old.data.on, old.data.listener.take(), old.elm),
            None => (&empty, None, None),
        };

        if let (Some(listener), Some(elm)) = (&old_listener, old_elm) {
            let new_on = new.as_ref().map(|n| &n.data.on);
            for name in old_on.keys() {
                let kept = new_on.is_some_and(|on| on.contains_key(name));
                if !kept {
                    if listener.has(name) {
                        cx.host.remove_listener(elm, name);
                    }
                    listener.handlers.borrow_mut().remove(name);
                }
            }
        }

        let Some(new) = new else { return };
        if new.data.on.is_empty() {
            return;
        }
        let Some(elm) = new.elm else { return };
        let listener = old_listener.unwrap_or_else(|| Rc::new(Listener::new(cx.emitter())));
        for (name, handler) in &new.data.on {
            if !listener.has(name) {
                let shared: Rc<dyn EventListener> = listener.clone();
                cx.host.add_listener(elm, name, shared);
            }
            listener
                .handlers
                .borrow_mut()
                .insert(name.clone(), handler.clone());
        }
        new.data.listener = Some(listener);
    }
}

impl Module for ListenerModule {
    fn create(&self, cx: &mut PatchContext<'_>, node: &mut Node) {
        Self::reconcile(cx, None, Some(node));
    }

    fn update(&self, cx: &mut PatchContext<'_>, old: &mut Node, new: &mut Node) {
        Self::reconcile(cx, Some(old), Some(new));
    }

    fn destroy(&self, cx: &mut PatchContext<'_>, node: &mut Node) {
        Self::reconcile(cx, Some(node), None);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::dom::{ElementId, MemoryDom};
    use crate::patch::{PatchTarget, Patcher};
    use crate::vdom::{h, VNode};

    fn button(events: &[(&'static str, u32)]) -> Node {
        let mut node: VNode<u32> = h("button", []);
        for (name, value) in events {
            let value = *value;
            node = node.on(*name, move |_| Some(value));
        }
        h("div", [node]).into_node()
    }

    #[test]
    fn changed_handler_is_swapped_without_host_churn() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let emit: Emit = Rc::new(move |msg| {
            if let Ok(n) = msg.downcast::<u32>() {
                log.borrow_mut().push(*n);
            }
        });
        let dom = RefCell::new(MemoryDom::new());
        let root = {
            let mut d = dom.borrow_mut();
            let body = d.body();
            d.append_element(body, "div")
        };
        let patcher = Patcher::default();

        let (tree, _) = patcher.patch(&mut *dom.borrow_mut(), &emit, PatchTarget::Element(root), button(&[("click", 1), ("focus", 9)]));
        let btn: ElementId = tree.children()[0].elm().expect("button");
        dom.borrow_mut().reset_stats();

        let (_, _) = patcher.patch(&mut *dom.borrow_mut(), &emit, PatchTarget::Node(tree), button(&[("click", 2)]));
        let stats = dom.borrow().stats();
        assert_eq!(stats.listeners_added, 0);
        assert_eq!(stats.listeners_removed, 1);
        assert_eq!(dom.borrow().listener_names(btn), vec!["click".to_string()]);

        MemoryDom::dispatch(&dom, &DomEvent::new("click", btn));
        assert_eq!(*seen.borrow(), vec![2]);
    }
}
