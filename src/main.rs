use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use tealoop::app::{make, AppInstance, AppOptions, RenderTarget};
use tealoop::config::RuntimeConfig;
use tealoop::dom::{DomHost, ElementId, MemoryDom};
use tealoop::interpreter::{interpret_never, merge_interpreter};
use tealoop::logging::init_tracing;
use tealoop::render::ManualFrames;
use tealoop::storage::{storage_interpreter, SnapshotStore};
use tealoop::todo::{TodoAction, TodoApp, Visibility};
use tealoop::transport::{ReconnectPolicy, ReconnectingTransport, TcpConnector, TransportEvent};

/// Upper bound on frames fired while waiting for the display to settle.
const SETTLE_FRAMES: usize = 8;

#[derive(Parser)]
#[command(name = "tealoop")]
#[command(about = "Headless TodoMVC running on the tealoop runtime")]
struct Cli {
    /// Config file (default: ~/.config/tealoop/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Snapshot file, overriding [storage] from the config
    #[arg(long)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a todo
    Add { text: String },
    /// Flip the completed flag of a todo
    Toggle { id: u64 },
    /// Replace the text of a todo
    Edit { id: u64, text: String },
    /// Delete a todo
    Remove { id: u64 },
    /// Mark every todo completed, or active with --undo
    ToggleAll {
        #[arg(long)]
        undo: bool,
    },
    /// Delete completed todos
    ClearCompleted,
    /// Render the list
    Show {
        /// all, active or completed
        #[arg(long, default_value = "all")]
        filter: Visibility,
    },
    /// Add every line received from a TCP peer as a todo, until the peer
    /// disconnects
    Listen {
        /// host:port (default: [transport] url from the config)
        url: Option<String>,
    },
}

/// The todo app running on an in-memory display.
struct Session {
    dom: Rc<RefCell<MemoryDom>>,
    frames: ManualFrames,
    app: AppInstance<TodoApp>,
    root: ElementId,
}

impl Session {
    fn start(store: &SnapshotStore) -> Result<Self> {
        let component = TodoApp::from_store(store)
            .with_context(|| format!("loading todos from {}", store.path().display()))?;

        let dom = Rc::new(RefCell::new(MemoryDom::new()));
        let root = {
            let mut dom = dom.borrow_mut();
            let body = dom.body();
            dom.append_element(body, "div")
        };
        let frames = ManualFrames::new();
        let host: Rc<RefCell<dyn DomHost>> = dom.clone();
        let target = RenderTarget {
            host,
            root,
            frames: Rc::new(frames.clone()),
        };

        let interpreter = merge_interpreter(storage_interpreter(store.clone()), interpret_never());
        let app = make(interpreter, component, target, AppOptions::default());
        Ok(Self {
            dom,
            frames,
            app,
            root,
        })
    }

    fn apply(&self, actions: impl IntoIterator<Item = TodoAction>) {
        for action in actions {
            self.app.push(action);
        }
        self.app.run();
        self.frames.settle(SETTLE_FRAMES);
    }

    fn html(&self) -> String {
        let dom = self.dom.borrow();
        let body = dom.body();
        dom.children(body)
            .into_iter()
            .map(|child| dom.to_html(child))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn add_todo(text: String) -> [TodoAction; 2] {
    [TodoAction::UpdatePending(text), TodoAction::AddTodo]
}

fn main() -> Result<()> {
    if let Some(log) = init_tracing() {
        tracing::info!(log = %log.display(), "tealoop starting");
    }
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RuntimeConfig::load_from(path),
        None => RuntimeConfig::load(),
    }
    .context("loading config")?;

    let store = match &cli.storage {
        Some(path) => SnapshotStore::new(path),
        None => SnapshotStore::from_config(&config.storage),
    };
    let session = Session::start(&store)?;
    tracing::debug!(root = %session.root, path = %store.path().display(), "session started");

    match cli.command {
        Command::Add { text } => session.apply(add_todo(text)),
        Command::Toggle { id } => {
            let model = session.app.snapshot();
            let Some(todo) = model.find(id) else {
                bail!("no todo with id {id}");
            };
            session.apply([TodoAction::ToggleTodo {
                id,
                completed: !todo.completed,
            }]);
        }
        Command::Edit { id, text } => {
            if session.app.snapshot().find(id).is_none() {
                bail!("no todo with id {id}");
            }
            session.apply([TodoAction::UpdateTodo { id, text }]);
        }
        Command::Remove { id } => session.apply([TodoAction::DeleteTodo(id)]),
        Command::ToggleAll { undo } => session.apply([TodoAction::ToggleAll(!undo)]),
        Command::ClearCompleted => session.apply([TodoAction::DeleteCompleted]),
        Command::Show { filter } => session.apply([TodoAction::ChangeVisibility(filter)]),
        Command::Listen { url } => {
            let Some(url) = url.or_else(|| config.transport.url.clone()) else {
                bail!("no url given and [transport] url is not set");
            };
            listen(&session, &url, &config)?;
        }
    }

    println!("{}", session.html());
    Ok(())
}

fn listen(session: &Session, url: &str, config: &RuntimeConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    let local = tokio::task::LocalSet::new();
    let policy = ReconnectPolicy::from(&config.transport);
    let interval = config.render.frame_interval();

    local.block_on(&runtime, async {
        let painter = tokio::task::spawn_local(session.frames.clone().drive(interval));
        let mut transport = ReconnectingTransport::spawn(TcpConnector::new(url), policy);

        while let Some(event) = transport.next_event().await {
            match event {
                TransportEvent::Connected => eprintln!("connected to {url}"),
                TransportEvent::Message(bytes) => {
                    let line = String::from_utf8_lossy(&bytes).trim().to_string();
                    if !line.is_empty() {
                        for action in add_todo(line) {
                            session.app.push(action);
                        }
                        session.app.run();
                    }
                }
                TransportEvent::Disconnected => {
                    transport.close();
                }
                TransportEvent::Closed => break,
            }
        }
        painter.abort();
    });

    session.frames.settle(SETTLE_FRAMES);
    Ok(())
}
