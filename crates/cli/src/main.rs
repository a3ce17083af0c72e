use std::process::ExitCode;

fn main() -> ExitCode {
    shelf_cli::run()
}
