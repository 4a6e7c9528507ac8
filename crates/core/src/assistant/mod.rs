//! Rule-based assistant.
//!
//! Classifies a chat message by keyword and answers from a month overview.
//! No state is kept between messages.

pub mod service;

pub use service::{AssistantReply, AssistantService, Intent};
