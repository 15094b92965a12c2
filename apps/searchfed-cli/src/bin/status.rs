use searchfed_cli::{cancel_on_ctrl_c, error_report, init_tracing, print_error};
use searchfed_core::config::Config;
use searchfed_federation::FederatedSearchEngine;

fn run() -> anyhow::Result<String> {
    let settings = Config::load()?.settings()?;
    let runtime = tokio::runtime::Runtime::new()?;
    let status = runtime.block_on(async {
        let engine = FederatedSearchEngine::from_settings(settings, None)?;
        anyhow::Ok(engine.cluster_status(&cancel_on_ctrl_c()).await)
    })?;
    Ok(serde_json::to_string_pretty(&status)?)
}

fn main() {
    init_tracing();
    match run() {
        Ok(doc) => println!("{}", doc),
        Err(e) => {
            print_error(&error_report(&e));
            std::process::exit(1);
        }
    }
}
