/*!
 * Virtual File System Module
 * Path grammar, drive resolution and concrete drive backends
 */

pub mod local;
pub mod memory;
pub mod paths;
pub mod resolver;
pub mod specifier;
pub mod types;

// Re-exports
pub use local::{tree_size, LocalDrive};
pub use memory::MemoryDrive;
pub use paths::{split, VirtualPath};
pub use resolver::{Resolved, Resolver};
pub use specifier::{find_drive, Ordinal, OrdinalKind};
pub use types::{Entry, FileType, VfsError, VfsResult};
