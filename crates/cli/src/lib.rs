pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "bitacora",
    about = "Bitacora maintenance-log assistant CLI",
    long_about = "Drive the conversational activity-logging assistant from a terminal, \
                  inspect effective configuration, and run readiness checks.",
    after_help = "Examples:\n  bitacora doctor --json\n  bitacora config\n  bitacora chat --area Calderas --equipment \"CALDERA #1\" --specialty Mecánica --work-type Preventivo"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive logging session for one activity")]
    Chat(commands::chat::ChatArgs),
    #[command(about = "Inspect effective configuration values with the API key redacted")]
    Config,
    #[command(about = "Validate config and LLM credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat(args) => commands::chat::run(args),
        Command::Config => CommandResult { exit_code: 0, output: commands::config::run() },
        Command::Doctor { json } => {
            CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
