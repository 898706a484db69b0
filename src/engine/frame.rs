use super::renderer::RenderBackend;
use super::view::ViewRegistry;
use super::CancelToken;
use crate::browser;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// The platform's paint-scheduling primitive.
pub trait FrameScheduler {
    /// Runs `frame` once, at the next paint opportunity.
    fn schedule(&self, frame: Box<dyn FnOnce()>);
}

/// `requestAnimationFrame`.
pub struct AnimationFrames;

impl FrameScheduler for AnimationFrames {
    fn schedule(&self, frame: Box<dyn FnOnce()>) {
        if let Err(err) = browser::request_animation_frame_once(move |_time: f64| frame()) {
            log::error!("frame loop stopped: {:#}", err);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No current view, or it is paused.
    Idle,
    /// The current view was mid-borrow elsewhere; try again next frame.
    Busy,
    Painted,
}

/// Updates and paints whatever view is current, once per frame.
///
/// It keeps no view of its own: every frame asks the registry, so a switch
/// shows up on the very next frame.
pub struct FrameDriver<R> {
    views: Rc<RefCell<ViewRegistry>>,
    backend: R,
}

impl<R: RenderBackend + 'static> FrameDriver<R> {
    pub fn new(views: Rc<RefCell<ViewRegistry>>, backend: R) -> Self {
        FrameDriver { views, backend }
    }

    pub fn tick(&mut self) -> FrameOutcome {
        let current = self.views.borrow().current();
        let Some(view) = current else {
            return FrameOutcome::Idle;
        };
        let Ok(mut view) = view.try_borrow_mut() else {
            log::warn!("current view busy, skipping frame");
            return FrameOutcome::Busy;
        };
        if view.is_paused() {
            return FrameOutcome::Idle;
        }
        view.update();
        self.backend.render(view.stage());
        FrameOutcome::Painted
    }

    /// Starts the frame chain. Each frame schedules its successor before
    /// doing any work, so a skipped frame never ends the chain; only
    /// [`FrameHandle::stop`] does.
    pub fn start<S: FrameScheduler + 'static>(self, scheduler: Rc<S>) -> FrameHandle {
        let handle = FrameHandle {
            stop: CancelToken::new(),
            frames: Rc::new(Cell::new(0)),
        };
        schedule_frame(
            Rc::new(RefCell::new(self)),
            scheduler,
            handle.clone(),
        );
        handle
    }
}

fn schedule_frame<R, S>(driver: Rc<RefCell<FrameDriver<R>>>, scheduler: Rc<S>, handle: FrameHandle)
where
    R: RenderBackend + 'static,
    S: FrameScheduler + 'static,
{
    let next = Rc::clone(&scheduler);
    scheduler.schedule(Box::new(move || {
        if handle.stop.is_cancelled() {
            log::debug!("frame loop stopped after {} frames", handle.frames());
            return;
        }
        handle.frames.set(handle.frames.get() + 1);
        schedule_frame(Rc::clone(&driver), next, handle.clone());
        driver.borrow_mut().tick();
    }));
}

/// Control over a running frame chain. Dropping it leaves the loop running.
#[derive(Debug, Clone)]
pub struct FrameHandle {
    stop: CancelToken,
    frames: Rc<Cell<u64>>,
}

impl FrameHandle {
    /// The next frame callback does no work and schedules nothing.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.stop.is_cancelled()
    }

    /// Frames that have run so far.
    pub fn frames(&self) -> u64 {
        self.frames.get()
    }
}
