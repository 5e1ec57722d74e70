//! Static asset adapters.

mod filesystem;

pub use filesystem::FilesystemAssets;
