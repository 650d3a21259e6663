// scaffold - project scaffolding CLI
// Main CLI entry point

use clap::Parser;
use scaffold::cli::{Cli, CliDispatcher};
use scaffold::utils::error::UserError;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match CliDispatcher::execute(cli).await {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            let user_error = UserError::from_scaffold_error(&err);
            user_error.print();
            user_error.exit_code
        }
    };

    process::exit(code);
}
