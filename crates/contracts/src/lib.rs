//! # Contracts
//!
//! Frozen interface contracts shared by the reader, the destination writers and
//! the command line front end.
//!
//! ## Data Model
//! - A `Chunk` is produced once per read and shared read-only by every destination
//! - Destinations are identified by `DestinationId`; `-` is always a literal file name

mod chunk;
mod destination;
mod error;
mod sink;

pub use chunk::*;
pub use destination::*;
pub use error::*;
pub use sink::*;
