// src/lib.rs
// AI Translator - progressive translation with a fast pass and language-model escalation

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod background;
pub mod cli;
pub mod config;
pub mod error;
pub mod fast;
pub mod llm;
pub mod sink;
pub mod translate;
pub mod types;

pub use error::{Result, TranslatorError};
