use std::io::{self, BufRead, Write};
use std::sync::Arc;

use bitacora_agent::llm::OpenAiGateway;
use bitacora_agent::session::{ConversationSession, SessionState, SubmitOutcome};
use bitacora_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use bitacora_core::domain::context::ActivityContext;
use bitacora_core::domain::extraction::ExtractionResult;
use bitacora_core::domain::message::Role;
use clap::Args;
use tracing_subscriber::EnvFilter;

use super::CommandResult;

#[derive(Debug, Args)]
pub struct ChatArgs {
    #[arg(long, help = "Plant area where the work happened")]
    pub area: String,
    #[arg(long, help = "Equipment the activity was performed on")]
    pub equipment: String,
    #[arg(long, help = "Maintenance specialty (mecánica, eléctrica, ...)")]
    pub specialty: String,
    #[arg(long = "work-type", help = "Work type (preventivo, correctivo, ...)")]
    pub work_type: String,
    #[arg(long = "service-order", help = "Optional service-order id")]
    pub service_order: Option<String>,
    #[arg(long, help = "Initial free-form description; skips the greeting")]
    pub seed: Option<String>,
}

pub fn run(args: ChatArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure(format!("config validation failed: {error}"), 2),
    };

    init_tracing(&config.logging);

    let gateway = match OpenAiGateway::from_config(&config.llm) {
        Ok(gateway) => gateway,
        Err(error) => return CommandResult::failure(error.to_string(), 2),
    };

    let mut context =
        ActivityContext::new(args.area, args.equipment, args.specialty, args.work_type);
    if let Some(service_order) = args.service_order {
        context = context.with_service_order(service_order);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure(format!("runtime start failed: {error}"), 2),
    };

    runtime.block_on(run_session(gateway, context, args.seed))
}

async fn run_session(
    gateway: OpenAiGateway,
    context: ActivityContext,
    seed: Option<String>,
) -> CommandResult {
    let session = Arc::new(ConversationSession::new(gateway));
    let mut printed_turns = 0usize;

    if let Err(error) = session.open(context, seed.as_deref()).await {
        return CommandResult::failure(error.to_string(), 2);
    }
    flush_assistant_turns(&session, &mut printed_turns);

    let stdin = io::stdin();
    loop {
        if session.state() == SessionState::ResultReady {
            if let Some(pending) = session.pending_result() {
                println!("\n{}", render_result(&pending));
                println!("Escribe `confirmar` para aplicar, `salir` para descartar, o sigue escribiendo para ajustar.");
            }
        }

        print!("tú> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                session.close();
                return CommandResult::success("sesión cerrada sin aplicar resultado");
            }
            Ok(_) => {}
            Err(error) => {
                session.close();
                return CommandResult::failure(format!("stdin read failed: {error}"), 2);
            }
        }

        match line.trim() {
            "" => continue,
            "salir" | "cancelar" => {
                session.close();
                return CommandResult::success("sesión cerrada sin aplicar resultado");
            }
            "confirmar" => match session.confirm() {
                Ok(result) => return CommandResult::success(render_result(&result)),
                Err(error) => {
                    println!("{error}");
                    continue;
                }
            },
            text => match session.submit(text).await {
                Ok(SubmitOutcome::Discarded) => {
                    return CommandResult::success("sesión cerrada sin aplicar resultado")
                }
                Ok(_) => flush_assistant_turns(&session, &mut printed_turns),
                Err(error) => {
                    session.close();
                    return CommandResult::failure(error.to_string(), 2);
                }
            },
        }
    }
}

/// Prints assistant turns appended since the last flush. User turns are not
/// echoed; the operator just typed them.
fn flush_assistant_turns<G: bitacora_agent::llm::ChatCompleter>(
    session: &ConversationSession<G>,
    printed_turns: &mut usize,
) {
    let history = session.history();
    for turn in history.iter().skip(*printed_turns) {
        if turn.role == Role::Assistant {
            println!("asistente> {}", turn.content);
        }
    }
    *printed_turns = history.len();
}

fn render_result(result: &ExtractionResult) -> String {
    let novelty = result.novelty.as_deref().unwrap_or("sin novedad");
    format!(
        "----------------------------------------\n\
         Descripción: {}\n\
         Novedad: {}\n\
         ----------------------------------------",
        result.description, novelty
    )
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr);
    let init_result = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    // A second init (e.g. under tests) is harmless.
    drop(init_result);
}
