use super::{Module, PatchContext};
use crate::vdom::Node;

/// Runs `created` / `removed` element callbacks. Their messages are emitted
/// after the patch.
pub struct RefModule;

impl Module for RefModule {
    fn create(&self, cx: &mut PatchContext<'_>, node: &mut Node) {
        let (Some(elm), Some(elem_ref)) = (node.elm, node.elem_ref()) else {
            return;
        };
        if let Some(msg) = elem_ref.created(elm) {
            cx.emit_after_patch(msg);
        }
    }

    fn destroy(&self, cx: &mut PatchContext<'_>, node: &mut Node) {
        let (Some(elm), Some(elem_ref)) = (node.elm, node.elem_ref()) else {
            return;
        };
        if let Some(msg) = elem_ref.removed(elm) {
            cx.emit_after_patch(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::dom::{ElementId, MemoryDom};
    use crate::patch::{Emit, PatchTarget, Patcher};
    use crate::vdom::{h, VNode};

    #[derive(Debug, PartialEq)]
    enum Msg {
        Created(ElementId),
        Removed(ElementId),
    }

    fn tracked() -> VNode<Msg> {
        h("input", [])
            .on_created(|el| Some(Msg::Created(el)))
            .on_removed(|el| Some(Msg::Removed(el)))
    }

    fn take(msgs: Vec<crate::vdom::AnyMsg>) -> Vec<Msg> {
        msgs.into_iter()
            .filter_map(|m| m.downcast::<Msg>().ok().map(|m| *m))
            .collect()
    }

    #[test]
    fn created_and_removed_messages_are_returned() {
        let mut dom = MemoryDom::new();
        let root = dom.append_element(dom.body(), "div");
        let patcher = Patcher::default();
        let emit: Emit = Rc::new(|_| {});

        let (tree, created) = patcher.patch(&mut dom, &emit, PatchTarget::Element(root), h("div", [tracked()]).into_node());
        let input = tree.children()[0].elm().expect("input");
        assert_eq!(take(created), vec![Msg::Created(input)]);

        let (_, removed) = patcher.patch(&mut dom, &emit, PatchTarget::Node(tree), h::<Msg>("div", []).into_node());
        assert_eq!(take(removed), vec![Msg::Removed(input)]);
    }
}
