//! autosave-runtime: async side of draft auto-save.
//! Debounce scheduler, the controller task, save handlers and the JSON file
//! store used by the `autosave` binary.

pub mod controller;
pub mod debounce;
pub mod error;
pub mod file_store;
pub mod handler;

pub use controller::{AutoSaveBuilder, AutoSaveController, ForceSaveOutcome};
pub use debounce::DebounceScheduler;
pub use error::RuntimeError;
pub use file_store::JsonFileStore;
pub use handler::{SaveHandler, SaveHooks, StoreSaveHandler};
