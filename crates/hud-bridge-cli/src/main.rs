use hud_bridge_cli::{run_cli, CliError};

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        eprintln!("Error: {}", e);
        if let CliError::Relay {
            details: Some(details),
            ..
        } = &e
        {
            eprintln!("Details: {}", details);
        }

        std::process::exit(e.exit_code());
    }
}
