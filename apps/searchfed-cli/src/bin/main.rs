use std::env;
use std::sync::Arc;

use searchfed_cli::{cancel_on_ctrl_c, decode_request, error_report, init_tracing, print_error};
use searchfed_core::config::Config;
use searchfed_core::request::SearchRequest;
use searchfed_core::traits::Embedder;
use searchfed_embed::get_default_embedder;
use searchfed_federation::FederatedSearchEngine;

fn run() -> anyhow::Result<String> {
    let arg = env::args().nth(1);
    let args = decode_request(arg.as_deref(), std::io::stdin())?;
    let settings = Config::load()?.settings()?;
    let request = SearchRequest::from_json(&args, &settings.search)?;

    // The model is only worth loading when the request needs a vector.
    let embedder: Option<Arc<dyn Embedder>> = match request {
        SearchRequest::Semantic(_) => match get_default_embedder(&settings.embedding) {
            Ok(embedder) => Some(embedder),
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "embedder unavailable, semantic search will return no results");
                None
            }
        },
        _ => None,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let response = runtime.block_on(async {
        let engine = FederatedSearchEngine::from_settings(settings, embedder)?;
        let cancel = cancel_on_ctrl_c();
        anyhow::Ok(engine.execute(request, &cancel).await)
    })?;
    Ok(serde_json::to_string(&response)?)
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
