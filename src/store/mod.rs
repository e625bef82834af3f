pub mod client;
pub mod queue;
pub mod remote;
pub mod version;

pub use client::{PersistRequest, VersionClient};
pub use queue::{PersistOutcome, PersistQueue, PersistTicket};
pub use remote::HttpVersionStore;
pub use version::{InMemoryVersionStore, VersionStore};
