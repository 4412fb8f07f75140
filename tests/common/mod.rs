//! Shared test utilities: recording processes, a counter component and an
//! in-memory render target.

#![allow(dead_code, unused_imports)]

use std::cell::RefCell;
use std::rc::Rc;

use tealoop::app::{make, AppInstance, AppInterpreter, AppOptions, Component, RenderTarget, Transition};
use tealoop::dom::{DomEvent, DomHost, ElementId, MemoryDom};
use tealoop::interpreter::{merge_interpreter, Either};
use tealoop::queue::{BoxLoop, Loop, Process, QueueHandle};
use tealoop::patch::{Emit, PatchTarget, Patcher};
use tealoop::render::ManualFrames;
use tealoop::vdom::{h, on_click, text, AnyMsg, Node, VNode};

/// Upper bound on frames fired by [`Fixture::settle`].
pub const SETTLE_FRAMES: usize = 16;

// -- Recording processes ------------------------------------------------------

/// One call observed by a recording process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seen<I> {
    Step(I),
    Tick,
}

pub type Journal<I> = Rc<RefCell<Vec<Seen<I>>>>;

struct Recorder<I> {
    journal: Journal<I>,
}

impl<I: 'static> Loop<I> for Recorder<I> {
    fn step(self: Box<Self>, input: I) -> BoxLoop<I> {
        self.journal.borrow_mut().push(Seen::Step(input));
        self
    }

    fn tick(self: Box<Self>) -> BoxLoop<I> {
        self.journal.borrow_mut().push(Seen::Tick);
        self
    }
}

/// Process that records every step and tick and emits nothing.
pub fn recording<I: 'static, O: 'static>() -> (Process<I, O>, Journal<I>) {
    let journal: Journal<I> = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&journal);
    let process: Process<I, O> =
        Box::new(move |_: QueueHandle<O>| -> BoxLoop<I> { Box::new(Recorder { journal: log }) });
    (process, journal)
}

/// Inputs a journal saw, ticks dropped.
pub fn steps<I: Clone>(journal: &Journal<I>) -> Vec<I> {
    journal
        .borrow()
        .iter()
        .filter_map(|seen| match seen {
            Seen::Step(input) => Some(input.clone()),
            Seen::Tick => None,
        })
        .collect()
}

pub fn ticks<I>(journal: &Journal<I>) -> usize {
    journal.borrow().iter().filter(|seen| matches!(seen, Seen::Tick)).count()
}

/// Output handle that collects everything pushed to it.
pub fn collector<O: 'static>() -> (QueueHandle<O>, Rc<RefCell<Vec<O>>>) {
    let out = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&out);
    (QueueHandle::from_fn(move |value: O| sink.borrow_mut().push(value)), out)
}

// -- Counter component --------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Count {
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterAction {
    Increment,
    Decrement,
    Noop,
    /// Emits a `Save` then a `Log` effect.
    Persist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEffect {
    Save(i64),
    Log(&'static str),
}

/// Counter whose subscriptions are the current count.
#[derive(Default)]
pub struct Counter {
    /// Model of every `render` call, in order.
    pub renders: Rc<RefCell<Vec<i64>>>,
}

impl Component for Counter {
    type Model = Count;
    type Action = CounterAction;
    type Effect = CounterEffect;
    type Sub = i64;

    fn init(&self) -> Transition<Count, CounterEffect> {
        Transition::pure(Count::default())
    }

    fn update(&self, model: &Count, action: CounterAction) -> Transition<Count, CounterEffect> {
        match action {
            CounterAction::Increment => Transition::pure(Count {
                count: model.count + 1,
            }),
            CounterAction::Decrement => Transition::pure(Count {
                count: model.count - 1,
            }),
            CounterAction::Noop => Transition::pure(*model),
            CounterAction::Persist => Transition::pure(*model)
                .with_effect(CounterEffect::Save(model.count))
                .with_effect(CounterEffect::Log("persisted")),
        }
    }

    fn render(&self, model: &Count) -> VNode<CounterAction> {
        self.renders.borrow_mut().push(model.count);
        h(
            "div.counter",
            [
                on_click(h("button.dec", [text("-")]), CounterAction::Decrement),
                h("span.value", [text(model.count.to_string())]),
                on_click(h("button.inc", [text("+")]), CounterAction::Increment),
            ],
        )
    }

    fn subscriptions(&self, model: &Count) -> Vec<i64> {
        vec![model.count]
    }
}

/// Journals of the effect (left) and subscription (right) channels.
pub struct Channels {
    pub effects: Journal<CounterEffect>,
    pub subs: Journal<i64>,
}

pub fn recording_interpreter() -> (AppInterpreter<Counter>, Channels) {
    let (effects, effect_journal) = recording();
    let (subs, sub_journal) = recording();
    (
        merge_interpreter(effects, subs),
        Channels {
            effects: effect_journal,
            subs: sub_journal,
        },
    )
}

// -- Render target ------------------------------------------------------------

/// `MemoryDom` with a mount point under `body`, plus manual frames.
pub struct Fixture {
    pub dom: Rc<RefCell<MemoryDom>>,
    pub frames: ManualFrames,
    pub root: ElementId,
}

impl Fixture {
    pub fn new() -> Self {
        let dom = Rc::new(RefCell::new(MemoryDom::new()));
        let root = {
            let mut dom = dom.borrow_mut();
            let body = dom.body();
            dom.append_element(body, "div")
        };
        Self {
            dom,
            frames: ManualFrames::new(),
            root,
        }
    }

    pub fn target(&self) -> RenderTarget {
        let host: Rc<RefCell<dyn DomHost>> = self.dom.clone();
        RenderTarget {
            host,
            root: self.root,
            frames: Rc::new(self.frames.clone()),
        }
    }

    pub fn settle(&self) -> usize {
        self.frames.settle(SETTLE_FRAMES)
    }

    pub fn body(&self) -> ElementId {
        self.dom.borrow().body()
    }

    pub fn query(&self, selector: &str) -> Option<ElementId> {
        let body = self.body();
        self.dom.borrow().query(body, selector)
    }

    pub fn query_all(&self, selector: &str) -> Vec<ElementId> {
        let body = self.body();
        self.dom.borrow().query_all(body, selector)
    }

    pub fn text_of(&self, selector: &str) -> Option<String> {
        let el = self.query(selector)?;
        Some(self.dom.borrow().text_content(el))
    }

    /// Dispatch `event` on the first element matching `selector`.
    pub fn fire(&self, selector: &str, event: impl FnOnce(ElementId) -> DomEvent) -> bool {
        let Some(el) = self.query(selector) else {
            return false;
        };
        MemoryDom::dispatch(&self.dom, &event(el))
    }

    pub fn click(&self, selector: &str) -> bool {
        self.fire(selector, |el| DomEvent::new("click", el))
    }

    pub fn dispatch(&self, event: DomEvent) -> bool {
        MemoryDom::dispatch(&self.dom, &event)
    }

    pub fn html(&self) -> String {
        let body = self.body();
        self.dom.borrow().to_html(body)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

// -- Raw patching -------------------------------------------------------------

/// Emit callback collecting messages of type `T`; anything else panics.
pub fn typed_emit<T: 'static>() -> (Emit, Rc<RefCell<Vec<T>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let emit: Emit = Rc::new(move |msg: AnyMsg| {
        let msg = msg.downcast::<T>().expect("message of the expected type");
        sink.borrow_mut().push(*msg);
    });
    (emit, seen)
}

/// Patches successive trees onto a `MemoryDom` without a scheduler.
pub struct Stage {
    pub dom: Rc<RefCell<MemoryDom>>,
    pub root: ElementId,
    pub patcher: Patcher,
    pub emit: Emit,
    pub current: Option<Node>,
}

impl Stage {
    pub fn new(emit: Emit) -> Self {
        let dom = Rc::new(RefCell::new(MemoryDom::new()));
        let root = {
            let mut dom = dom.borrow_mut();
            let body = dom.body();
            dom.append_element(body, "div")
        };
        Self {
            dom,
            root,
            patcher: Patcher::default(),
            emit,
            current: None,
        }
    }

    /// Patch `tree` and return the messages raised during the patch.
    pub fn patch<A>(&mut self, tree: VNode<A>) -> Vec<AnyMsg> {
        let target = match self.current.take() {
            Some(prev) => PatchTarget::Node(prev),
            None => PatchTarget::Element(self.root),
        };
        let (realized, emitted) = {
            let mut host = self.dom.borrow_mut();
            self.patcher.patch(&mut *host, &self.emit, target, tree.into_node())
        };
        self.current = Some(realized);
        emitted
    }

    pub fn current(&self) -> &Node {
        self.current.as_ref().expect("patched at least once")
    }

    pub fn query(&self, selector: &str) -> Option<ElementId> {
        let body = self.dom.borrow().body();
        self.dom.borrow().query(body, selector)
    }

    pub fn fire(&self, event: DomEvent) -> bool {
        MemoryDom::dispatch(&self.dom, &event)
    }

    pub fn html(&self) -> String {
        let body = self.dom.borrow().body();
        self.dom.borrow().to_html(body)
    }
}

/// Counter app on a fresh fixture with recording interpreters.
pub fn counter_app() -> (AppInstance<Counter>, Fixture, Channels, Rc<RefCell<Vec<i64>>>) {
    let fixture = Fixture::new();
    let counter = Counter::default();
    let renders = Rc::clone(&counter.renders);
    let (interpreter, channels) = recording_interpreter();
    let app = make(interpreter, counter, fixture.target(), AppOptions::default());
    (app, fixture, channels, renders)
}
