pub mod changes;
pub mod code;
pub mod entry;
pub mod version;

pub use changes::*;
pub use code::*;
pub use entry::*;
pub use version::*;
