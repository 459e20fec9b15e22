/*!
 * VFS Types
 * Shared types for path resolution and backend access
 */

mod entry;
mod errors;
mod file_type;

pub use entry::Entry;
pub use errors::{VfsError, VfsResult};
pub use file_type::FileType;
