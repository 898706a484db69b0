use anyhow::{Context, Result};
use engine::frame::{AnimationFrames, FrameDriver};
use engine::image::ImageSource;
use engine::loader::{ResourceLoader, Resources};
use engine::renderer::CanvasRenderer;
use engine::stage::{Size, Texture};
use engine::view::ViewRegistry;
use engine::Engine;
use std::cell::RefCell;
use std::rc::Rc;
use views::{GameView, MessageView, GAME_VIEW, MESSAGE_VIEW};
use wasm_bindgen::prelude::*;

pub mod browser;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod sprite;
pub mod views;

/// Main entry for the WebAssembly module
/// - installs panic and log hooks
/// - starts the render loop on the message view
/// - loads textures, then hands over to the game view
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // better panic messages for debugging
    console_error_panic_hook::set_once();
    // the configured level replaces this once config.json is read
    console_log::init_with_level(log::Level::Info)
        .map_err(|err| JsValue::from(format!("could not start logging: {}", err)))?;

    browser::spawn_local(async move {
        if let Err(err) = start().await {
            log::error!("could not start the game: {:#}", err);
        }
    });

    Ok(())
}

async fn start() -> Result<()> {
    let config = config::AppConfig::fetch(config::CONFIG_PATH).await;
    log::set_max_level(config.log_level());
    let manifest = config.manifest()?;
    let size = config.logical_size();

    let engine = Engine::install(Engine::new())?;
    let renderer = CanvasRenderer::new(size).context("setting up the canvas")?;
    // the loop runs for the life of the page
    FrameDriver::new(engine.views(), renderer).start(Rc::new(AnimationFrames));

    let message = Rc::new(RefCell::new(MessageView::new(size)));
    engine
        .views()
        .borrow_mut()
        .register(MESSAGE_VIEW, message.clone());
    engine.views().borrow_mut().switch_to(MESSAGE_VIEW)?;

    subscribe_loading(&engine, &message, size);
    ResourceLoader::load_all(
        &engine.textures(),
        Rc::new(ImageSource::new(config.load_timeout_ms)),
        &manifest,
        browser::spawn_boxed,
    );
    Ok(())
}

/// Progress goes to the message view, failures too; completion opens the
/// game view and starts the world.
pub fn subscribe_loading(engine: &Engine, message: &Rc<RefCell<MessageView>>, size: Size) {
    let textures = engine.textures();
    let mut loader = textures.borrow_mut();

    let progress = Rc::clone(message);
    loader.on_item_loaded(move |name, progress_so_far| {
        // a failure stays on screen for the rest of the cycle
        if progress_so_far.failed > 0 {
            return;
        }
        progress.borrow_mut().set_message(format!(
            "Loading textures: {} ({}/{})",
            name, progress_so_far.loaded, progress_so_far.total
        ));
    });

    let registry = engine.views();
    loader.on_all_loaded(move |textures| {
        if let Err(err) = open_game(&registry, textures, size) {
            log::error!("could not open the game view: {:#}", err);
        }
    });

    let registry = engine.views();
    let failed = Rc::clone(message);
    loader.on_load_failed(move |failure| {
        let text = format!("Could not load texture '{}'", failure.name);
        if let Err(err) = views::show_message(&registry, &failed, text) {
            log::error!("could not report load failure: {:#}", err);
        }
    });
}

fn open_game(
    views: &RefCell<ViewRegistry>,
    textures: &Resources<Texture>,
    size: Size,
) -> Result<()> {
    // a later load cycle reuses the game view and its world
    let registered = views.borrow().get(GAME_VIEW).is_ok();
    if !registered {
        let mut game = GameView::new(textures, size)?;
        game.start_world(textures)?;
        views
            .borrow_mut()
            .register(GAME_VIEW, Rc::new(RefCell::new(game)));
    }
    views.borrow_mut().switch_to(GAME_VIEW)?;
    Ok(())
}
