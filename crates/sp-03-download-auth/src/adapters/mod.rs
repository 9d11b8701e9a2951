//! # Adapters

pub mod fs_content;

pub use fs_content::FsContentProvider;
