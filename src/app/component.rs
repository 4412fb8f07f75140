//! Component contract.

use crate::vdom::VNode;

/// New model plus the effects to interpret, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S, F> {
    pub model: S,
    pub effects: Vec<F>,
}

impl<S, F> Transition<S, F> {
    pub fn new(model: S, effects: Vec<F>) -> Self {
        Self { model, effects }
    }

    /// Transition with no effects.
    pub fn pure(model: S) -> Self {
        Self {
            model,
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: F) -> Self {
        self.effects.push(effect);
        self
    }
}

/// An application the driver can run.
///
/// `update` and `render` must be pure: effects are only described, and
/// rendering the same model must give the same tree (thunks rely on it).
/// Change detection compares models with `PartialEq`.
pub trait Component: 'static {
    type Model: Clone + PartialEq + 'static;

    type Action: Clone + 'static;

    /// Effects produced by `update`, interpreted on the left channel.
    type Effect: 'static;

    /// Subscription inputs re-derived at every commit, interpreted on the
    /// right channel.
    type Sub: 'static;

    fn init(&self) -> Transition<Self::Model, Self::Effect>;

    fn update(&self, model: &Self::Model, action: Self::Action) -> Transition<Self::Model, Self::Effect>;

    fn render(&self, model: &Self::Model) -> VNode<Self::Action>;

    fn subscriptions(&self, _model: &Self::Model) -> Vec<Self::Sub> {
        Vec::new()
    }
}
