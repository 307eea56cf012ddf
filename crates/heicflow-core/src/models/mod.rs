//! Data models for the conversion pipeline
//!
//! Each sub-module covers one side of the pipeline: the incoming storage
//! event, the file record in the document store, and the invocation outcome.

mod event;
mod file_record;
mod outcome;

pub use event::*;
pub use file_record::*;
pub use outcome::*;
