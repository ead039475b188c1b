//! Streaming session entities: messages, output frames, and the
//! accumulated outcome handed to persistence.

pub mod frame;
pub mod message;
pub mod outcome;
