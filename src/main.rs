use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = chamberctl::cli::Cli::parse();
    let exit_code = chamberctl::run(cli).await;
    std::process::exit(exit_code);
}
