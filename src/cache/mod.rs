//! Fragment cache for magazine blocks.
//!
//! Rendered block HTML is keyed by a [`Fingerprint`] of the normalized
//! options and stored in a bounded LRU. Any content mutation invalidates
//! every fragment at once; concurrent misses on the same fingerprint share a
//! single render.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! fragment_limit = 256
//! single_flight_wait_ms = 5000
//! # snapshot_path = "var/fragments.json"
//! ```

mod config;
mod events;
mod flight;
mod keys;
mod listener;
pub(crate) mod lock;
mod persist;
mod service;
mod store;

pub use config::CacheConfig;
pub use events::{Epoch, MutationBus, MutationEvent, MutationKind};
pub use keys::{FINGERPRINT_VERSION, Fingerprint};
pub use listener::{InvalidationListener, ListenerHandle};
pub use persist::{PersistError, RestoreReport};
pub use service::{Computed, FragmentCache, SharedFragmentCache};
pub use store::Generation;
