use std::sync::{Mutex, MutexGuard};

use bitacora_core::domain::context::ActivityContext;
use bitacora_core::domain::extraction::ExtractionResult;
use bitacora_core::domain::message::Message;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classify::{classify, Reply};
use crate::llm::{ChatCompleter, GatewayError};
use crate::prompt::build_system_prompt;

/// Apology turn appended when a transient gateway failure is absorbed into
/// the conversation instead of escalating.
pub const APOLOGY: &str =
    "Lo siento, hubo un error al procesar tu mensaje. Verifica tu conexión o intenta de nuevo.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created but never opened.
    Idle,
    /// Open; accepting user turns.
    AwaitingInput,
    /// A structured result is stored and awaits explicit confirmation.
    ResultReady,
    /// Terminal; all state discarded. Reopening resets everything.
    Closed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session transition: cannot {action} while {state:?}")]
    InvalidTransition { state: SessionState, action: &'static str },
    #[error("no extraction result is pending confirmation")]
    NoResultPending,
    #[error("a submit is already in flight for this session")]
    SubmitInFlight,
    #[error("llm credential is not configured: {0}")]
    Configuration(String),
}

/// What one `open`/`submit` call did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Whitespace-only input; nothing happened.
    Ignored,
    /// An assistant turn was appended; the session keeps accepting input.
    Conversational,
    /// A structured result is stored and awaits `confirm`.
    ResultReady,
    /// Transient gateway failure absorbed as an apology turn.
    Recovered,
    /// The session was closed or reopened while the call was in flight; the
    /// late reply was discarded without touching state.
    Discarded,
}

struct SessionInner {
    state: SessionState,
    context: Option<ActivityContext>,
    history: Vec<Message>,
    pending_result: Option<ExtractionResult>,
    in_flight: bool,
    generation: u64,
}

/// Multi-turn dialogue engine that collects a free-form account of a
/// maintenance activity and drives it to a confirmed structured result.
///
/// The gateway is constructor-injected so tests can script replies without
/// network access. Interior locking uses short critical sections; the lock
/// is never held across the gateway call. The in-flight flag serializes
/// submits and the generation counter guards against a stale reply writing
/// into a closed or reopened session.
pub struct ConversationSession<G> {
    gateway: G,
    inner: Mutex<SessionInner>,
}

impl<G: ChatCompleter> ConversationSession<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                context: None,
                history: Vec::new(),
                pending_result: None,
                in_flight: false,
                generation: 0,
            }),
        }
    }

    /// Opens the session bound to a fresh context. Valid from `Idle` or
    /// `Closed` (reopen resets everything). With a non-empty seed the call
    /// behaves as `submit(seed)` and no greeting is shown; otherwise a single
    /// assistant greeting referencing the equipment and area is appended.
    pub async fn open(
        &self,
        context: ActivityContext,
        seed: Option<&str>,
    ) -> Result<SubmitOutcome, SessionError> {
        let seed = seed.map(str::trim).unwrap_or_default().to_string();
        {
            let mut inner = self.lock();
            match inner.state {
                SessionState::Idle | SessionState::Closed => {}
                state => return Err(SessionError::InvalidTransition { state, action: "open" }),
            }

            inner.generation = inner.generation.wrapping_add(1);
            inner.state = SessionState::AwaitingInput;
            inner.history.clear();
            inner.pending_result = None;
            inner.in_flight = false;
            if seed.is_empty() {
                inner.history.push(Message::assistant(greeting_for(&context)));
            }
            inner.context = Some(context);
            info!(seeded = !seed.is_empty(), "conversation session opened");
        }

        if seed.is_empty() {
            Ok(SubmitOutcome::Conversational)
        } else {
            self.submit(&seed).await
        }
    }

    /// Sends one user turn through the pipeline. Valid in `AwaitingInput` and
    /// in `ResultReady` (the user may keep refining after seeing a result).
    ///
    /// Transient gateway failures are absorbed as an apology turn and the
    /// session stays usable; only a missing credential escalates.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, SessionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }

        let (system, prior, generation) = {
            let mut inner = self.lock();
            match inner.state {
                SessionState::AwaitingInput | SessionState::ResultReady => {}
                state => {
                    return Err(SessionError::InvalidTransition { state, action: "submit" })
                }
            }
            if inner.in_flight {
                return Err(SessionError::SubmitInFlight);
            }
            let Some(context) = inner.context.as_ref() else {
                return Err(SessionError::InvalidTransition {
                    state: inner.state,
                    action: "submit",
                });
            };

            let system = build_system_prompt(context);
            let prior = inner.history.clone();
            inner.history.push(Message::user(trimmed));
            inner.in_flight = true;
            (system, prior, inner.generation)
        };

        debug!(prior_turns = prior.len(), "submitting user turn");
        let reply = self.gateway.complete(&system, &prior, trimmed).await;

        let mut inner = self.lock();
        if inner.generation != generation || inner.state == SessionState::Closed {
            debug!("discarding late reply for a closed or reopened session");
            return Ok(SubmitOutcome::Discarded);
        }
        inner.in_flight = false;

        match reply {
            Ok(raw) => match classify(&raw) {
                Reply::Conversational(text) => {
                    inner.history.push(Message::assistant(text));
                    inner.pending_result = None;
                    inner.state = SessionState::AwaitingInput;
                    Ok(SubmitOutcome::Conversational)
                }
                Reply::Structured { result, acknowledgement } => {
                    inner.history.push(Message::assistant(acknowledgement));
                    inner.pending_result = Some(result);
                    inner.state = SessionState::ResultReady;
                    info!("structured result ready for confirmation");
                    Ok(SubmitOutcome::ResultReady)
                }
            },
            Err(GatewayError::Configuration(reason)) => {
                warn!(%reason, "llm credential missing; escalating");
                Err(SessionError::Configuration(reason))
            }
            Err(error) => {
                warn!(%error, "llm call failed; recovering with apology turn");
                inner.history.push(Message::assistant(APOLOGY));
                inner.pending_result = None;
                inner.state = SessionState::AwaitingInput;
                Ok(SubmitOutcome::Recovered)
            }
        }
    }

    /// Surfaces the stored result and closes the session. Valid only in
    /// `ResultReady`; otherwise fails without mutating history.
    pub fn confirm(&self) -> Result<ExtractionResult, SessionError> {
        let mut inner = self.lock();
        if inner.state != SessionState::ResultReady {
            return Err(SessionError::NoResultPending);
        }
        let Some(result) = inner.pending_result.take() else {
            return Err(SessionError::NoResultPending);
        };

        discard(&mut inner);
        info!("extraction result confirmed; session closed");
        Ok(result)
    }

    /// Discards all state. Valid from any state; a reply still in flight will
    /// be dropped on arrival.
    pub fn close(&self) {
        let mut inner = self.lock();
        discard(&mut inner);
        info!("conversation session closed");
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Snapshot of the conversation history, in exact conversation order.
    pub fn history(&self) -> Vec<Message> {
        self.lock().history.clone()
    }

    pub fn pending_result(&self) -> Option<ExtractionResult> {
        self.lock().pending_result.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn discard(inner: &mut SessionInner) {
    inner.state = SessionState::Closed;
    inner.context = None;
    inner.history.clear();
    inner.pending_result = None;
    inner.in_flight = false;
    inner.generation = inner.generation.wrapping_add(1);
}

fn greeting_for(context: &ActivityContext) -> String {
    format!(
        "Hola, veo que trabajaste en **{}** ({}). ¿Qué actividad realizaste?",
        context.equipment, context.area
    )
}
