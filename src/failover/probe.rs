//! Liveness probe for freshly built connections

use crate::client::{StoreCommands, StoreConnection};
use crate::utils::StoreError;

/// PING the connection; anything but PONG means the endpoint is not usable
pub fn probe<C: StoreConnection + ?Sized>(conn: &mut C) -> Result<(), StoreError> {
    if conn.ping()? {
        Ok(())
    } else {
        Err(StoreError::Protocol("endpoint did not answer PONG".to_string()))
    }
}
