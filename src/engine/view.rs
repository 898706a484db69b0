use super::stage::Stage;
use crate::error::EngineError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Paused flag plus the stage a view paints. Every view starts paused; only
/// [`ViewRegistry::switch_to`] moves it in and out of that state.
#[derive(Debug)]
pub struct ViewCore {
    paused: bool,
    stage: Stage,
}

impl ViewCore {
    pub fn new(stage: Stage) -> Self {
        ViewCore {
            paused: true,
            stage,
        }
    }

    /// active -> paused. Returns whether anything changed.
    pub fn pause(&mut self) -> bool {
        if self.paused {
            return false;
        }
        self.paused = true;
        self.stage.set_interactive(false);
        true
    }

    /// paused -> active. Returns whether anything changed.
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        self.stage.set_interactive(true);
        true
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }
}

/// A presentation unit: loading screen, gameplay screen, ...
///
/// Implementors only have to expose their [`ViewCore`]; the lifecycle
/// methods delegate to it unless a view needs to hook a transition.
pub trait View {
    fn core(&self) -> &ViewCore;
    fn core_mut(&mut self) -> &mut ViewCore;

    /// Called once per frame while the view is current and not paused.
    fn update(&mut self) {}

    fn pause(&mut self) -> bool {
        self.core_mut().pause()
    }

    fn resume(&mut self) -> bool {
        self.core_mut().resume()
    }

    fn is_paused(&self) -> bool {
        self.core().is_paused()
    }

    fn stage(&self) -> &Stage {
        self.core().stage()
    }
}

pub type SharedView = Rc<RefCell<dyn View>>;

/// Named views and which one is on screen.
///
/// The registry holds the views but `current` is only a name into that
/// map; nothing is ever unregistered.
#[derive(Default)]
pub struct ViewRegistry {
    views: HashMap<String, SharedView>,
    current: Option<String>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `view` under `name`. The first registration wins: if the name
    /// is taken the existing view is returned and `view` is dropped.
    pub fn register(&mut self, name: impl Into<String>, view: SharedView) -> SharedView {
        let name = name.into();
        if let Some(existing) = self.views.get(&name) {
            log::debug!("view '{}' already registered", name);
            return Rc::clone(existing);
        }
        log::debug!("registered view '{}'", name);
        self.views.insert(name, Rc::clone(&view));
        view
    }

    /// Makes `name` the current view, pausing the previous one first.
    ///
    /// Switching to the view that is already current does not pause it;
    /// its `resume` is still called and reports `false`.
    pub fn switch_to(&mut self, name: &str) -> Result<SharedView, EngineError> {
        let next = self
            .views
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::ViewNotFound(name.to_string()))?;

        let previous = match self.current.as_deref() {
            Some(current) if current != name => self
                .views
                .get(current)
                .map(|view| (current.to_string(), Rc::clone(view))),
            _ => None,
        };

        // Check both borrows up front so a failed switch leaves no view
        // half transitioned.
        let mut next_view = next
            .try_borrow_mut()
            .map_err(|_| EngineError::ViewBusy(name.to_string()))?;
        if let Some((previous_name, previous)) = &previous {
            let mut previous_view = previous
                .try_borrow_mut()
                .map_err(|_| EngineError::ViewBusy(previous_name.clone()))?;
            let paused = previous_view.pause();
            log::debug!("paused '{}': {}", previous_name, paused);
        }

        self.current = Some(name.to_string());
        let resumed = next_view.resume();
        log::debug!("resumed '{}': {}", name, resumed);
        drop(next_view);

        Ok(next)
    }

    pub fn get(&self, name: &str) -> Result<SharedView, EngineError> {
        self.views
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::ViewNotFound(name.to_string()))
    }

    pub fn current(&self) -> Option<SharedView> {
        self.current
            .as_deref()
            .and_then(|name| self.views.get(name))
            .cloned()
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
