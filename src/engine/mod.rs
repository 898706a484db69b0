//! View and texture lifecycle: load textures, switch views, drive frames.
pub mod frame;
pub mod image;
pub mod loader;
pub mod renderer;
pub mod stage;
pub mod view;

use crate::error::EngineError;
use loader::SharedLoader;
use once_cell::unsync::OnceCell;
use stage::Texture;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use view::ViewRegistry;

// wasm runs on a single thread, so thread-local is process-wide there
thread_local! {
    static ENGINE: OnceCell<Engine> = OnceCell::new();
}

/// The application's view registry and texture loader.
///
/// Collaborators get an `Engine` (or one of its halves) passed in. There is
/// also one process-wide instance for code that cannot be handed one.
#[derive(Clone, Default)]
pub struct Engine {
    views: Rc<RefCell<ViewRegistry>>,
    textures: SharedLoader<Texture>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `engine` the process-wide instance. Fails if one already
    /// exists, whether installed or created by [`Engine::instance`].
    pub fn install(engine: Engine) -> Result<Engine, EngineError> {
        ENGINE.with(|cell| {
            cell.set(engine.clone())
                .map(|_| engine)
                .map_err(|_| EngineError::DuplicateSingleton("Engine"))
        })
    }

    /// The process-wide instance, created on first use.
    pub fn instance() -> Engine {
        ENGINE.with(|cell| cell.get_or_init(Engine::new).clone())
    }

    pub fn views(&self) -> Rc<RefCell<ViewRegistry>> {
        Rc::clone(&self.views)
    }

    pub fn textures(&self) -> SharedLoader<Texture> {
        Rc::clone(&self.textures)
    }

    pub fn same_as(&self, other: &Engine) -> bool {
        Rc::ptr_eq(&self.views, &other.views) && Rc::ptr_eq(&self.textures, &other.textures)
    }
}

/// Shared stop flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}
