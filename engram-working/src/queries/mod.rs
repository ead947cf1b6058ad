//! SQL for the working store, one module per concern.

pub mod conversation_ops;
pub mod message_ops;
