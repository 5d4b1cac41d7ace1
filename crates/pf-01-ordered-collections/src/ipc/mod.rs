//! Transport module for ordered collections
//!
//! Request/response payloads and the handler that maps them onto the
//! coordinator. Owner identity comes from the request; the handler performs
//! no authentication of its own.

pub mod handler;
pub mod payloads;

pub use handler::CollectionRequestHandler;
pub use payloads::*;
