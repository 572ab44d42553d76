//! Session management

pub mod connector;

pub use connector::Connector;
