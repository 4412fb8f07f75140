use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use super::AppChange;

type Callback<S, A> = Rc<dyn Fn(&AppChange<S, A>)>;

/// State shared between the running queue and the [`super::AppInstance`]:
/// the last known model and the change subscribers.
pub(crate) struct Shared<S, A> {
    snapshot: RefCell<S>,
    fresh: Cell<u64>,
    callbacks: RefCell<BTreeMap<u64, Callback<S, A>>>,
}

impl<S: Clone, A> Shared<S, A> {
    pub(crate) fn new(model: S) -> Self {
        Self {
            snapshot: RefCell::new(model),
            fresh: Cell::new(0),
            callbacks: RefCell::new(BTreeMap::new()),
        }
    }

    pub(crate) fn snapshot(&self) -> S {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn set_snapshot(&self, model: S) {
        *self.snapshot.borrow_mut() = model;
    }

    pub(crate) fn add(&self, callback: impl Fn(&AppChange<S, A>) + 'static) -> u64 {
        let key = self.fresh.get();
        self.fresh.set(key + 1);
        self.callbacks.borrow_mut().insert(key, Rc::new(callback));
        key
    }

    pub(crate) fn remove(&self, key: u64) -> bool {
        self.callbacks.borrow_mut().remove(&key).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Record the new model and call every subscriber. Subscribers may
    /// subscribe or unsubscribe from inside the callback.
    pub(crate) fn notify(&self, change: &AppChange<S, A>) {
        self.set_snapshot(change.model.clone());
        let callbacks: Vec<Callback<S, A>> = self.callbacks.borrow().values().cloned().collect();
        for callback in callbacks {
            callback(change);
        }
    }
}

/// Returned by [`super::AppInstance::subscribe`]. Dropping it keeps the
/// subscription; call [`Unsubscribe::unsubscribe`] to end it.
pub struct Unsubscribe<S, A> {
    shared: Weak<Shared<S, A>>,
    key: u64,
}

impl<S, A> Unsubscribe<S, A> {
    pub(crate) fn new(shared: &Rc<Shared<S, A>>, key: u64) -> Self {
        Self {
            shared: Rc::downgrade(shared),
            key,
        }
    }
}

impl<S: Clone, A> Unsubscribe<S, A> {
    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.shared.upgrade() {
            Some(shared) => shared.remove(self.key),
            None => false,
        }
    }
}
