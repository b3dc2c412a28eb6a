//! Client connection layer

pub mod raw_connection;
pub mod store;

pub use raw_connection::{ConnectionFactory, RawConnection};
pub use store::{
    check_reply, Connector, Expiry, SetOptions, StoreCommands, StoreConnection, StoreValue,
};
