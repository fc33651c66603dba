use tokio_util::sync::CancellationToken;

use openapi_client_runner::config::RunnerConfig;
use openapi_client_runner::dotnet::DotnetCli;
use openapi_client_runner::download::HttpDownloader;
use openapi_client_runner::git::ShellGit;
use openapi_client_runner::pipeline::Pipeline;
use openapi_client_runner::process::ShellRunner;
use openapi_client_runner::usings::DotnetImportsFixer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = RunnerConfig::from_env();
    config.trace_loaded();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            ctrl_c.cancel();
        }
    });

    let pipeline = Pipeline::new(
        config,
        ShellGit,
        HttpDownloader::new(),
        ShellRunner,
        DotnetCli,
        DotnetImportsFixer::new(),
    );

    match pipeline.run(&cancel).await {
        Ok(report) => {
            println!("Regeneration complete.\nReport:");
            println!("{:#?}", report);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("[ERROR] Regeneration failed: {e:#}");
            std::process::exit(1);
        }
    }
}
