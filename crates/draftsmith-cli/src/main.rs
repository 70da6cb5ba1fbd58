// Draftsmith CLI Entry Point

use draftsmith_cli::{logging::VerbosityLevel, output, router::CommandRouter};

#[tokio::main]
async fn main() {
    let result = CommandRouter::route().await;

    // Exit with appropriate code
    if let Err(e) = result {
        output::print_error(&e.user_message());
        if VerbosityLevel::current() == VerbosityLevel::Verbose {
            eprintln!("{}", e.technical_details());
        }
        std::process::exit(1);
    }
}
