//! Diff/patch of display trees onto a [`DomHost`].
//!
//! Keyed two-ended children reconciliation; per-node behavior (attributes,
//! properties, classes, listeners, refs, host extensions) lives in
//! [`Module`]s invoked on create, update and destroy.

mod listener;
mod modules;
mod refs;

use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::{DomHost, ElementId};
use crate::vdom::{push_down, render_thunk, AnyMsg, Node, Selector};

pub(crate) use listener::Listener;
pub use listener::ListenerModule;
pub use modules::{AttrsModule, ClassModule, PropsModule};
pub use refs::RefModule;

/// Drives a message back into the application (`push` + `run`).
pub type Emit = Rc<dyn Fn(AnyMsg)>;

/// What a patch is applied against.
pub enum PatchTarget {
    /// First patch: take over an existing host element.
    Element(ElementId),
    /// Diff against the tree returned by the previous patch.
    Node(Node),
}

/// Host access plus the messages collected while patching.
pub struct PatchContext<'a> {
    pub host: &'a mut dyn DomHost,
    emit: Emit,
    emitted: Vec<AnyMsg>,
}

impl PatchContext<'_> {
    /// Callback for messages raised later, outside the patch (listeners).
    pub fn emitter(&self) -> Emit {
        Rc::clone(&self.emit)
    }

    /// Queue a message raised during the patch; it is emitted once the patch
    /// has completed.
    pub fn emit_after_patch(&mut self, msg: AnyMsg) {
        self.emitted.push(msg);
    }
}

/// Per-node lifecycle extension.
///
/// `create` runs after the element exists and before its children are
/// attached; `update` runs when a node is patched in place; `destroy` runs
/// for every node of a removed subtree.
pub trait Module {
    fn create(&self, _cx: &mut PatchContext<'_>, _node: &mut Node) {}

    fn update(&self, _cx: &mut PatchContext<'_>, _old: &mut Node, _new: &mut Node) {}

    fn destroy(&self, _cx: &mut PatchContext<'_>, _node: &mut Node) {}
}

/// Reconciles successive trees against one host.
pub struct Patcher {
    modules: Vec<Box<dyn Module>>,
}

impl Default for Patcher {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Patcher {
    /// Built-in attribute, property and class modules, then `extra`, then the
    /// listener and ref modules.
    pub fn new(extra: Vec<Box<dyn Module>>) -> Self {
        let mut modules: Vec<Box<dyn Module>> = vec![
            Box::new(AttrsModule),
            Box::new(PropsModule),
            Box::new(ClassModule),
        ];
        modules.extend(extra);
        modules.push(Box::new(ListenerModule));
        modules.push(Box::new(RefModule));
        Self { modules }
    }

    /// Patch `new` onto `target` and return the realized tree together with
    /// the messages raised by ref callbacks, which the caller emits once it
    /// has released the host.
    pub fn patch(
        &self,
        host: &mut dyn DomHost,
        emit: &Emit,
        target: PatchTarget,
        new: Node,
    ) -> (Node, Vec<AnyMsg>) {
        let mut cx = PatchContext {
            host,
            emit: Rc::clone(emit),
            emitted: Vec::new(),
        };
        let old = match target {
            PatchTarget::Element(id) => empty_node_at(cx.host, id),
            PatchTarget::Node(prev) => prev,
        };
        let realized = if same_vnode(&old, &new) {
            self.patch_vnode(&mut cx, old, new)
        } else {
            self.replace(&mut cx, old, new)
        };
        (realized, cx.emitted)
    }

    fn create_elm(&self, cx: &mut PatchContext<'_>, mut node: Node) -> Node {
        if let Some(thunk) = node.data.thunk.clone() {
            let Some(rendered) = render_thunk(&node) else {
                return node;
            };
            let mut created = self.create_elm(cx, rendered);
            created.data.thunk = Some(thunk);
            created.data.key = node.data.key.take();
            return created;
        }
        push_down(&mut node);

        if node.is_text() {
            let content = node.text.as_deref().unwrap_or_default();
            node.elm = Some(cx.host.create_text(content));
            return node;
        }

        let sel = node.sel.clone().unwrap_or_default();
        let parsed = Selector::parse(&sel);
        let elm = cx.host.create_element(parsed.tag);
        if let Some(id) = parsed.id {
            cx.host.set_attribute(elm, "id", id);
        }
        for class in &parsed.classes {
            cx.host.set_class(elm, class, true);
        }
        node.elm = Some(elm);

        for module in &self.modules {
            module.create(cx, &mut node);
        }

        let children = std::mem::take(&mut node.children);
        node.children = children
            .into_iter()
            .map(|child| {
                let created = self.create_elm(cx, child);
                if let Some(child_elm) = created.elm {
                    cx.host.insert_before(elm, child_elm, None);
                }
                created
            })
            .collect();
        node
    }

    fn patch_vnode(&self, cx: &mut PatchContext<'_>, mut old: Node, mut new: Node) -> Node {
        if let Some(thunk) = new.data.thunk.clone() {
            let fresh = old
                .data
                .thunk
                .as_ref()
                .is_some_and(|previous| thunk.matches(previous));
            if fresh {
                tracing::trace!(sel = %thunk.sel, "thunk unchanged, reusing subtree");
                old.data.thunk = Some(thunk);
                old.data.key = new.data.key.take();
                return old;
            }
            let Some(rendered) = render_thunk(&new) else {
                return old;
            };
            let mut out = if old.sel == rendered.sel {
                self.patch_vnode(cx, old, rendered)
            } else {
                self.replace(cx, old, rendered)
            };
            out.data.thunk = Some(thunk);
            out.data.key = new.data.key.take();
            return out;
        }
        push_down(&mut new);

        new.elm = old.elm;
        let Some(elm) = new.elm else {
            return self.create_elm(cx, new);
        };

        for module in &self.modules {
            module.update(cx, &mut old, &mut new);
        }

        if new.is_text() {
            if old.text != new.text {
                cx.host.set_text(elm, new.text.as_deref().unwrap_or_default());
            }
            return new;
        }

        let old_children = std::mem::take(&mut old.children);
        let new_children = std::mem::take(&mut new.children);
        new.children = match (old_children.is_empty(), new_children.is_empty()) {
            (false, false) => self.update_children(cx, elm, old_children, new_children),
            (true, false) => self.add_vnodes(cx, elm, None, new_children),
            (false, true) => {
                self.remove_vnodes(cx, elm, old_children);
                Vec::new()
            }
            (true, true) => Vec::new(),
        };
        new
    }

    fn update_children(
        &self,
        cx: &mut PatchContext<'_>,
        parent: ElementId,
        old_ch: Vec<Node>,
        new_ch: Vec<Node>,
    ) -> Vec<Node> {
        let mut old: Vec<Option<Node>> = old_ch.into_iter().map(Some).collect();
        let mut new: Vec<Option<Node>> = new_ch.into_iter().map(Some).collect();
        let mut out: Vec<Option<Node>> = (0..new.len()).map(|_| None).collect();

        let mut old_start = 0isize;
        let mut old_end = old.len() as isize - 1;
        let mut new_start = 0isize;
        let mut new_end = new.len() as isize - 1;
        let mut key_index: Option<HashMap<String, usize>> = None;

        while old_start <= old_end && new_start <= new_end {
            let (os, oe, ns, ne) = (
                old_start as usize,
                old_end as usize,
                new_start as usize,
                new_end as usize,
            );
            let Some(old_first) = old[os].as_ref() else {
                old_start += 1;
                continue;
            };
            let Some(old_last) = old[oe].as_ref() else {
                old_end -= 1;
                continue;
            };
            let (Some(new_first), Some(new_last)) = (new[ns].as_ref(), new[ne].as_ref()) else {
                break;
            };

            if same_vnode(old_first, new_first) {
                out[ns] = self.patch_pair(cx, &mut old[os], &mut new[ns]);
                old_start += 1;
                new_start += 1;
            } else if same_vnode(old_last, new_last) {
                out[ne] = self.patch_pair(cx, &mut old[oe], &mut new[ne]);
                old_end -= 1;
                new_end -= 1;
            } else if same_vnode(old_first, new_last) {
                let before = old_last.elm.and_then(|e| cx.host.next_sibling(e));
                let patched = self.patch_pair(cx, &mut old[os], &mut new[ne]);
                move_before(cx, parent, patched.as_ref(), before);
                out[ne] = patched;
                old_start += 1;
                new_end -= 1;
            } else if same_vnode(old_last, new_first) {
                let before = old_first.elm;
                let patched = self.patch_pair(cx, &mut old[oe], &mut new[ns]);
                move_before(cx, parent, patched.as_ref(), before);
                out[ns] = patched;
                old_end -= 1;
                new_start += 1;
            } else {
                let before = old_first.elm;
                let index = key_index.get_or_insert_with(|| {
                    (os..=oe)
                        .filter_map(|i| {
                            let key = old[i].as_ref()?.key()?;
                            Some((key.to_string(), i))
                        })
                        .collect()
                });
                let found = new_first.key().and_then(|k| index.get(k).copied());
                let reusable = found.filter(|&i| {
                    old[i]
                        .as_ref()
                        .is_some_and(|candidate| candidate.match_sel() == new_first.match_sel())
                });
                let placed = match reusable {
                    Some(i) => self.patch_pair(cx, &mut old[i], &mut new[ns]),
                    None => new[ns].take().map(|node| self.create_elm(cx, node)),
                };
                move_before(cx, parent, placed.as_ref(), before);
                out[ns] = placed;
                new_start += 1;
            }
        }

        if old_start > old_end {
            let before = out
                .get((new_end + 1) as usize)
                .and_then(|n| n.as_ref())
                .and_then(|n| n.elm);
            for ns in new_start..=new_end {
                let ns = ns as usize;
                if let Some(node) = new[ns].take() {
                    let created = self.create_elm(cx, node);
                    move_before(cx, parent, Some(&created), before);
                    out[ns] = Some(created);
                }
            }
        } else if new_start > new_end {
            let leftovers: Vec<Node> = old
                .drain(old_start as usize..=old_end as usize)
                .flatten()
                .collect();
            self.remove_vnodes(cx, parent, leftovers);
        }

        out.into_iter().flatten().collect()
    }

    fn patch_pair(
        &self,
        cx: &mut PatchContext<'_>,
        old: &mut Option<Node>,
        new: &mut Option<Node>,
    ) -> Option<Node> {
        match (old.take(), new.take()) {
            (Some(old), Some(new)) => Some(self.patch_vnode(cx, old, new)),
            (None, Some(new)) => Some(self.create_elm(cx, new)),
            (_, None) => None,
        }
    }

    fn add_vnodes(
        &self,
        cx: &mut PatchContext<'_>,
        parent: ElementId,
        before: Option<ElementId>,
        nodes: Vec<Node>,
    ) -> Vec<Node> {
        nodes
            .into_iter()
            .map(|node| {
                let created = self.create_elm(cx, node);
                move_before(cx, parent, Some(&created), before);
                created
            })
            .collect()
    }

    fn remove_vnodes(&self, cx: &mut PatchContext<'_>, parent: ElementId, nodes: Vec<Node>) {
        for mut node in nodes {
            self.invoke_destroy(cx, &mut node);
            if let Some(elm) = node.elm {
                cx.host.remove_child(parent, elm);
            }
        }
    }

    fn invoke_destroy(&self, cx: &mut PatchContext<'_>, node: &mut Node) {
        if node.is_text() {
            return;
        }
        for module in &self.modules {
            module.destroy(cx, node);
        }
        for child in &mut node.children {
            self.invoke_destroy(cx, child);
        }
    }

    /// Swap `old` for a freshly created `new` at the same position.
    fn replace(&self, cx: &mut PatchContext<'_>, old: Node, new: Node) -> Node {
        let old_elm = old.elm;
        let parent = old_elm.and_then(|e| cx.host.parent_node(e));
        let created = self.create_elm(cx, new);
        match parent {
            Some(parent) => {
                let before = old_elm.and_then(|e| cx.host.next_sibling(e));
                move_before(cx, parent, Some(&created), before);
                self.remove_vnodes(cx, parent, vec![old]);
            }
            None => {
                let mut old = old;
                self.invoke_destroy(cx, &mut old);
            }
        }
        created
    }
}

fn move_before(cx: &mut PatchContext<'_>, parent: ElementId, node: Option<&Node>, before: Option<ElementId>) {
    if let Some(elm) = node.and_then(|n| n.elm) {
        cx.host.insert_before(parent, elm, before);
    }
}

/// Same selector and same key.
pub(crate) fn same_vnode(a: &Node, b: &Node) -> bool {
    a.match_sel() == b.match_sel() && a.key() == b.key()
}

fn empty_node_at(host: &dyn DomHost, id: ElementId) -> Node {
    let mut node = Node::element(host.tag_name(id).unwrap_or_else(|| "div".to_string()));
    node.elm = Some(id);
    node
}
