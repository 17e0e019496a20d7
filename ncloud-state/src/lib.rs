//! NCloud State Management
//!
//! Records which platform identifier belongs to each resource declared in
//! a manifest, together with its last-read attributes.
//!
//! - **StateFile**: all managed resources, with serial and lineage
//! - **StateBackend**: storage plus locking; a local JSON file is the only backend
//! - **LockInfo**: who holds the lock and until when
//!
//! ```ignore
//! let backend = create_backend(&BackendConfig::local())?;
//! let lock = backend.acquire_lock("apply").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//! // ... apply, then record observed states ...
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{LocalBackend, create_backend};
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
