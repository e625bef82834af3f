pub mod config;
pub mod diff;
pub mod error;
pub mod history;
pub mod merge;
pub mod model;
pub mod reconstruct;
pub mod server;
pub mod session;
pub mod store;
pub mod telemetry;

pub use config::{AppConfig, HistoryConfig, LogConfig, ServerConfig, StoreConfig};
pub use diff::{apply_patch, generate_patch};
pub use error::{PagesmithError, PagesmithResult};
pub use history::HistoryStack;
pub use merge::merge;
pub use model::*;
pub use reconstruct::reconstruct_from_versions;
pub use session::EditorSession;
pub use store::{
    HttpVersionStore, InMemoryVersionStore, PersistQueue, PersistRequest, PersistTicket,
    VersionClient, VersionStore,
};
