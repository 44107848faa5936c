//! Score Client
//!
//! Selects clients from a dataset one after another, the way the dashboard
//! does, and logs the credit decision for each selection.
//!
//! Usage: score_client [dataset.json] [api_url] [client_id...]

use anyhow::Result;
use credit_scoring_service::{
    config::AppConfig, ClientDataset, DecisionEngine, InferenceClient, SessionCache,
};
use tracing::{error, info};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("score_client=info".parse()?)
                .add_directive("credit_scoring_service=info".parse()?),
        )
        .init();

    let config = AppConfig::load()?;

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let dataset_path = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| config.client.dataset_path.clone());
    let api_url = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| config.client.api_url.clone());

    let dataset = ClientDataset::load_json(&dataset_path, &config.client.id_column)?;

    // Default to the first five clients
    let selections: Vec<String> = if args.len() > 3 {
        args[3..].to_vec()
    } else {
        dataset.ids().iter().take(5).cloned().collect()
    };

    let mut client_config = config.client.clone();
    client_config.api_url = api_url;
    let client = InferenceClient::from_config(&client_config, config.model.feature_count)?;

    info!(
        dataset = %dataset_path,
        url = %client.predict_url(),
        clients = dataset.len(),
        selections = selections.len(),
        threshold = config.decision.threshold,
        "Score client configured"
    );

    let mut cache = SessionCache::new(client, DecisionEngine::new(config.decision.threshold));

    for client_id in &selections {
        match cache.select(client_id, &dataset) {
            Ok(session) => info!(
                client_id = %client_id,
                prediction = session.prediction,
                score = format!("{:.2}", session.score()),
                verdict = session.decision.verdict(),
                "Client scored"
            ),
            Err(e) => error!(client_id = %client_id, error = %e, "No decision available"),
        }
    }

    Ok(())
}
