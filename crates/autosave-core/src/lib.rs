//! autosave-core: pure domain logic for draft auto-save.
//! Status lifecycle, session state, configuration, role mapping and the
//! storage capability. No async, no IO.

pub mod config;
pub mod error;
pub mod indicator;
pub mod role;
pub mod session;
pub mod signature;
pub mod status;
pub mod storage;

pub use config::AutoSaveConfig;
pub use error::{CoreError, SaveError, TransitionError};
pub use indicator::IndicatorView;
pub use role::{BackendRole, FrontendRole};
pub use session::{AutoSaveSession, SaveSnapshot, StatusChange};
pub use signature::{SignatureStore, StoredSignature};
pub use status::{SaveEvent, SaveStatus};
pub use storage::{KeyValueStore, MemoryStore};
