//! Conversational extraction pipeline for maintenance-log activities.
//!
//! This crate turns a free-form account of a maintenance activity into a
//! structured logbook entry through a short clarifying dialogue with an LLM:
//!
//! 1. **Prompt building** (`prompt`) - Render the activity context and the
//!    conversation contract into a system instruction.
//! 2. **Completion** (`llm`) - One request/response exchange against a
//!    chat-completion API behind the `ChatCompleter` trait.
//! 3. **Classification** (`classify`) - Decide whether a raw reply is another
//!    conversational turn or carries an embedded structured result.
//! 4. **Orchestration** (`session`) - The `ConversationSession` state machine
//!    that owns history, the in-flight submit lock, and the terminal
//!    confirmation step.
//!
//! # Safety principle
//!
//! The model has no schema enforcement on its side: it may answer in prose,
//! JSON, or a mixture. The classifier routes every reply deterministically
//! and never corrupts history or silently drops a generated result. Malformed
//! embedded payloads degrade to conversational turns, never errors.

pub mod classify;
pub mod llm;
pub mod prompt;
pub mod session;

pub use classify::{classify, Reply};
pub use llm::{ChatCompleter, GatewayError, OpenAiGateway};
pub use session::{ConversationSession, SessionError, SessionState, SubmitOutcome};
