use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::dom::{DomHost, ElementId};
use crate::patch::{Emit, PatchTarget, Patcher};
use crate::vdom::{Node, VNode};

/// One display tree mounted on a host element.
///
/// The first patch takes over `root`; later patches diff against the tree
/// the previous patch produced.
pub struct Mount<A> {
    host: Rc<RefCell<dyn DomHost>>,
    root: ElementId,
    patcher: Patcher,
    emit: Emit,
    current: Option<Node>,
    patches: usize,
    _msg: PhantomData<fn() -> A>,
}

impl<A> Mount<A> {
    pub fn new(host: Rc<RefCell<dyn DomHost>>, root: ElementId, patcher: Patcher, emit: Emit) -> Self {
        Self {
            host,
            root,
            patcher,
            emit,
            current: None,
            patches: 0,
            _msg: PhantomData,
        }
    }

    /// Patch `tree` in, then emit whatever ref callbacks produced.
    pub fn patch(&mut self, tree: VNode<A>) {
        let target = match self.current.take() {
            Some(prev) => PatchTarget::Node(prev),
            None => PatchTarget::Element(self.root),
        };
        let (realized, emitted) = {
            let mut host = self.host.borrow_mut();
            self.patcher.patch(&mut *host, &self.emit, target, tree.into_node())
        };
        self.current = Some(realized);
        self.patches += 1;
        tracing::debug!(patches = self.patches, emitted = emitted.len(), "tree patched");
        for msg in emitted {
            (self.emit)(msg);
        }
    }

    /// Realized element of the current root.
    pub fn root_element(&self) -> ElementId {
        self.current
            .as_ref()
            .and_then(Node::elm)
            .unwrap_or(self.root)
    }

    pub fn patches(&self) -> usize {
        self.patches
    }
}
