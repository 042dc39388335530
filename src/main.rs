use clap::Parser;
use tracing_subscriber::EnvFilter;

use carloan::api::{Cli, Command, build_state, run_compare, run_http_server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compare(args) => match run_compare(&args) {
            Ok(output) => println!("{}", output.trim_end()),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        Command::Serve(args) => {
            let state = match build_state(&args) {
                Ok(state) => state,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            };
            if let Err(e) = run_http_server(args.port, state).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
    }
}
