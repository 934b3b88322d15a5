use std::process::ExitCode;

fn main() -> ExitCode {
    bitacora_cli::run()
}
