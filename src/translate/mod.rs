// src/translate/mod.rs
// Two-tier translation: reply parsing and the shallow/deep escalation protocol

mod escalation;
pub mod parser;

pub use escalation::{ESCALATION_THRESHOLD, EscalationProtocol, detect_input_language};
pub use parser::{Flag, ParsedReply, parse};
