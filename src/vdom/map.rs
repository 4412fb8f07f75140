//! Message-type mapping over display trees.

use std::any::type_name;
use std::rc::Rc;

use super::{AnyMsg, Node, VNode};

/// Erased message transform accumulated on a node.
pub(crate) type Transform = Rc<dyn Fn(AnyMsg) -> AnyMsg>;

/// Pipe every message emitted anywhere inside `node` through `f`.
///
/// Constant time: `f` is composed onto the root's pending transform, which
/// the patcher pushes into the subtree once per patch. Mapping twice is the
/// same as mapping once with the composition.
pub fn map_vnode<A, B>(f: impl Fn(A) -> B + 'static, node: VNode<A>) -> VNode<B>
where
    A: 'static,
    B: 'static,
{
    let mut node = node.into_node();
    compose_onto(&mut node, erase(f));
    VNode::from_node(node)
}

fn erase<A: 'static, B: 'static>(f: impl Fn(A) -> B + 'static) -> Transform {
    Rc::new(move |msg: AnyMsg| match msg.downcast::<A>() {
        Ok(value) => Box::new(f(*value)) as AnyMsg,
        Err(other) => {
            tracing::error!(
                expected = type_name::<A>(),
                "message of unexpected type reached a mapped subtree"
            );
            other
        }
    })
}

/// `node.cofn := outer ∘ node.cofn`
fn compose_onto(node: &mut Node, outer: Transform) {
    let composed: Transform = match node.data.cofn.take() {
        Some(inner) => Rc::new(move |msg| outer(inner(msg))),
        None => outer,
    };
    node.data.cofn = Some(composed);
}

/// Push the pending transform of a non-thunk node into its handlers, refs
/// and children. Called by the patcher when the node is created or patched.
pub(crate) fn push_down(node: &mut Node) {
    if node.data.thunk.is_some() {
        return;
    }
    if let Some(f) = node.data.cofn.take() {
        apply_transform(&f, node, true);
    }
}

/// Rewrite `node` so its messages pass through `f`.
///
/// Thunks and mapped descendants only get `f` composed onto their own
/// pending transform; they push it down themselves when patched.
pub(crate) fn apply_transform(f: &Transform, node: &mut Node, parent: bool) {
    if node.data.thunk.is_some() || (!parent && node.data.cofn.is_some()) {
        compose_onto(node, Rc::clone(f));
        return;
    }
    let handlers = std::mem::take(&mut node.data.on);
    node.data.on = handlers
        .into_iter()
        .map(|(name, handler)| (name, handler.piped(Rc::clone(f))))
        .collect();
    if let Some(elem_ref) = node.data.elem_ref.take() {
        node.data.elem_ref = Some(elem_ref.piped(Rc::clone(f)));
    }
    for child in &mut node.children {
        apply_transform(f, child, false);
    }
}
