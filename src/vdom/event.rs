//! Typed event helpers.

use super::VNode;

/// Emit `msg` on every click.
pub fn on_click<A: Clone + 'static>(node: VNode<A>, msg: A) -> VNode<A> {
    node.on("click", move |_| Some(msg.clone()))
}

/// Emit `f(value)` on every `input` event carrying the control's value.
pub fn on_input<A: 'static>(node: VNode<A>, f: impl Fn(String) -> A + 'static) -> VNode<A> {
    node.on("input", move |ev| ev.value.clone().map(&f))
}

/// React to `keyup`. `f` receives the key name and the control's current
/// value and returns `None` for keys it ignores.
pub fn on_key<A: 'static>(node: VNode<A>, f: impl Fn(&str, &str) -> Option<A> + 'static) -> VNode<A> {
    node.on("keyup", move |ev| {
        let key = ev.key.as_deref()?;
        f(key, ev.value.as_deref().unwrap_or_default())
    })
}

/// Emit `f(checked)` on `change` of a checkbox.
pub fn on_check<A: 'static>(node: VNode<A>, f: impl Fn(bool) -> A + 'static) -> VNode<A> {
    node.on("change", move |ev| ev.checked.map(&f))
}
