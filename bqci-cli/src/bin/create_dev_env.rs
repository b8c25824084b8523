use bqci_cli::{fatal, init_tracing, CreateDevEnvCli, EXIT_FATAL};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = CreateDevEnvCli::parse();
    if let Err(e) = init_tracing(cli.logging.verbose, cli.logging.log_json) {
        eprintln!("error: failed to initialize logging: {}", e);
        return ExitCode::from(EXIT_FATAL);
    }

    match cli.execute().await {
        Ok(outcome) => {
            for table in &outcome.plan.tables {
                println!("{} -> snapshot {}, clone {}", table.source, table.snapshot, table.clone);
            }
            println!("All tables created");
            ExitCode::SUCCESS
        }
        Err(e) => fatal(&e),
    }
}
