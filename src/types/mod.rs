//! Core types for desktop-pilot.

pub mod generation;
pub mod message;
pub mod request;
pub mod stream;

pub use generation::*;
pub use message::*;
pub use request::*;
pub use stream::*;
