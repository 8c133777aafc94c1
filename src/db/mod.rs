//! Store access: the cached connection gateway and its embedded schema.

pub mod gateway;
