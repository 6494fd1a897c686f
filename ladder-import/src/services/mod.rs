//! Supporting services

pub mod file_resolver;

pub use file_resolver::resolve_input_files;
