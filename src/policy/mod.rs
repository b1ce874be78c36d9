//! # Visibility Policy
//!
//! The registry never decides who may see whom. It asks a
//! [`ConnectionGraph`] handed to it by the host, on every lookup where the
//! requester differs from the owner.

pub mod connection;

pub use connection::{
    from_fn, ConnectionGraph, ConnectionTable, FnConnection, FullyConnected, Isolated,
};
