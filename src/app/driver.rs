//! Wiring of a [`Component`] to the event queue and render scheduler.

use std::cell::RefCell;
use std::rc::Rc;

use super::subscribers::{Shared, Unsubscribe};
use super::{AppAction, AppChange, Component};
use crate::dom::{DomHost, ElementId};
use crate::interpreter::Either;
use crate::patch::{Emit, Module, Patcher};
use crate::queue::{attach, with_accum, Accumulate, BoxLoop, Process, QueueHandle};
use crate::render::{FrameRequester, Mount, RenderScheduler};
use crate::vdom::AnyMsg;

/// Interpreter accepted by [`make`]: effects on the left, subscriptions on
/// the right, actions out.
pub type AppInterpreter<C> = Process<
    Either<<C as Component>::Effect, <C as Component>::Sub>,
    <C as Component>::Action,
>;

/// Where and how the application renders.
pub struct RenderTarget {
    pub host: Rc<RefCell<dyn DomHost>>,
    /// Element the first render takes over.
    pub root: ElementId,
    pub frames: Rc<dyn FrameRequester>,
}

/// Extra patch modules, run after the built-in attribute, property and
/// class modules and before the listener and ref modules.
#[derive(Default)]
pub struct AppOptions {
    pub modules: Vec<Box<dyn Module>>,
}

/// A running application.
pub struct AppInstance<C: Component> {
    queue: QueueHandle<AppAction<C>>,
    shared: Rc<Shared<C::Model, C::Action>>,
}

impl<C: Component> AppInstance<C> {
    /// Queue an action. Nothing happens until [`AppInstance::run`].
    pub fn push(&self, action: C::Action) {
        self.queue.push(AppAction::Action(action));
    }

    /// Process everything queued so far.
    pub fn run(&self) {
        self.queue.run();
    }

    pub fn dispatch(&self, action: C::Action) {
        self.push(action);
        self.run();
    }

    /// The most recent model.
    pub fn snapshot(&self) -> C::Model {
        self.shared.snapshot()
    }

    /// Queue a model swap that bypasses `update`: no effects, no change
    /// notification, but the new model is rendered.
    pub fn restore(&self, model: C::Model) {
        self.queue.push(AppAction::Restore(model));
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&AppChange<C::Model, C::Action>) + 'static,
    ) -> Unsubscribe<C::Model, C::Action> {
        let key = self.shared.add(callback);
        Unsubscribe::new(&self.shared, key)
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.len()
    }

    /// Push/run door for collaborators that only produce actions.
    pub fn actions(&self) -> QueueHandle<C::Action> {
        self.queue.map_input(AppAction::Action)
    }
}

struct AppState<C: Component> {
    model: C::Model,
    needs_render: bool,
    interpret: BoxLoop<Either<C::Effect, C::Sub>>,
}

struct AppQueue<C: Component> {
    component: Rc<C>,
    queue: QueueHandle<AppAction<C>>,
    scheduler: RenderScheduler<C::Model>,
    shared: Rc<Shared<C::Model, C::Action>>,
}

impl<C: Component> Accumulate<AppAction<C>> for AppQueue<C> {
    type State = AppState<C>;

    fn update(&self, mut state: AppState<C>, input: AppAction<C>) -> AppState<C> {
        match input {
            AppAction::Start => {}
            AppAction::Interpret(effect) => {
                state.interpret = state.interpret.step(effect);
            }
            AppAction::Action(action) => {
                let next = self.component.update(&state.model, action.clone());
                state.needs_render |= next.model != state.model;
                let old = std::mem::replace(&mut state.model, next.model);
                self.shared.notify(&AppChange {
                    old,
                    action,
                    model: state.model.clone(),
                });
                for effect in next.effects {
                    self.queue.push(AppAction::Interpret(Either::Left(effect)));
                }
            }
            AppAction::Restore(model) => {
                state.needs_render |= model != state.model;
                state.model = model;
                self.shared.set_snapshot(state.model.clone());
            }
        }
        state
    }

    fn commit(&self, mut state: AppState<C>) -> AppState<C> {
        if state.needs_render {
            self.scheduler.schedule(state.model.clone());
            state.needs_render = false;
        }
        let mut interpret = state.interpret;
        for sub in self.component.subscriptions(&state.model) {
            interpret = interpret.step(Either::Right(sub));
        }
        state.interpret = interpret.tick();
        state
    }
}

/// Start `component` on `target`, driving its effects and subscriptions
/// through `interpreter`.
///
/// The initial model is scheduled for rendering right away and the initial
/// effects are queued. The first [`AppInstance::run`] always commits, so the
/// initial subscriptions reach the interpreter even when no action is
/// pending; later runs on an empty queue do nothing.
pub fn make<C: Component>(
    interpreter: AppInterpreter<C>,
    component: C,
    target: RenderTarget,
    options: AppOptions,
) -> AppInstance<C> {
    let component = Rc::new(component);
    let init = component.init();
    let shared = Rc::new(Shared::new(init.model.clone()));
    let queue_shared = Rc::clone(&shared);

    let process: Process<AppAction<C>, AppAction<C>> =
        with_accum(move |queue: QueueHandle<AppAction<C>>| {
            let emit = action_emitter::<C>(queue.clone());
            let mut mount: Mount<C::Action> =
                Mount::new(target.host, target.root, Patcher::new(options.modules), emit);
            let renderer = Rc::clone(&component);
            let scheduler = RenderScheduler::new(target.frames, move |model: &C::Model| {
                mount.patch(renderer.render(model));
            });
            scheduler.schedule(init.model.clone());

            let interpret = interpreter(queue.map_input(AppAction::Action));
            queue.push(AppAction::Start);
            for effect in init.effects {
                queue.push(AppAction::Interpret(Either::Left(effect)));
            }

            let driver = AppQueue {
                component,
                queue,
                scheduler,
                shared: queue_shared,
            };
            let state = AppState {
                model: init.model,
                needs_render: false,
                interpret,
            };
            (driver, state)
        });

    AppInstance {
        queue: attach(process),
        shared,
    }
}

/// Emit callback for the patcher: messages leaving the tree are actions of
/// the component.
fn action_emitter<C: Component>(queue: QueueHandle<AppAction<C>>) -> Emit {
    Rc::new(move |msg: AnyMsg| match msg.downcast::<C::Action>() {
        Ok(action) => {
            queue.push(AppAction::Action(*action));
            queue.run();
        }
        Err(_) => {
            tracing::error!(
                expected = std::any::type_name::<C::Action>(),
                "display tree emitted a message of the wrong type"
            );
        }
    })
}
