use thiserror::Error;

/// Errors surfaced by the view and texture lifecycle.
///
/// Structural mistakes (a second engine, an unknown view name) are
/// programmer errors and are returned straight to the caller. Load
/// problems are delivered to the loader's failure subscribers instead of
/// being left to hang.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} is a singleton and has already been created")]
    DuplicateSingleton(&'static str),

    #[error("no view registered under '{0}'")]
    ViewNotFound(String),

    #[error("view '{0}' is busy and cannot change state right now")]
    ViewBusy(String),

    #[error("resource '{0}' has not been loaded")]
    ResourceNotLoaded(String),

    #[error("resource '{0}' appears more than once in the manifest")]
    DuplicateResource(String),

    #[error("loading '{file}' stalled after {after_ms} ms")]
    LoadStalled { file: String, after_ms: u32 },
}
