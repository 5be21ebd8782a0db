use clap::Parser;

mod cli;
pub mod exit_codes;

use cli::{dispatch, Cli};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
    let cli = Cli::parse();
    let code = dispatch(cli).await;
    std::process::exit(code);
}
