//! Subcommand handlers. Results go to stdout; logs go to stderr.

use std::time::Instant;

use serde_json::json;

use pricescout_scraper::{evaluate_alert, PriceAlert, ResultSource, SearchEngine};

use crate::Commands;

pub(crate) async fn run(engine: &SearchEngine, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Search { query, location } => {
            run_search(engine, &query, location.as_deref()).await
        }
        Commands::Stores => {
            run_stores(engine);
            Ok(())
        }
        Commands::Probe { store, query } => run_probe(engine, &store, &query).await,
        Commands::Recheck {
            url,
            target,
            notified,
        } => run_recheck(engine, url, target, notified).await,
    }
}

async fn run_search(
    engine: &SearchEngine,
    query: &str,
    location: Option<&str>,
) -> anyhow::Result<()> {
    let outcome = engine.search_detailed(query, location).await;
    if let ResultSource::Mock(reason) = outcome.source {
        tracing::warn!(?reason, "no live results; showing synthetic products");
    }
    let body = json!({
        "count": outcome.products.len(),
        "products": outcome.products,
        "source": outcome.source,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn run_stores(engine: &SearchEngine) {
    for store in engine.stores() {
        let coverage = if store.covers_island {
            "island-wide".to_string()
        } else {
            store
                .location
                .clone()
                .or_else(|| store.city.clone())
                .unwrap_or_else(|| "-".to_string())
        };
        let placeholder = if store.is_placeholder() {
            " (placeholder)"
        } else {
            ""
        };
        println!(
            "{:<14} {:<16} {:<12} {}{placeholder}",
            store.id,
            store.method.to_string(),
            coverage,
            store.base_url
        );
    }
}

async fn run_probe(engine: &SearchEngine, store_id: &str, query: &str) -> anyhow::Result<()> {
    let started = Instant::now();
    let products = engine.probe(store_id, query).await?;
    let elapsed_ms = started.elapsed().as_millis();

    println!(
        "{store_id}: {} products for \"{query}\" in {elapsed_ms} ms",
        products.len()
    );
    for p in &products {
        println!("  {:>10.2} {}  {}  {}", p.price, p.currency, p.name, p.url);
    }
    Ok(())
}

async fn run_recheck(
    engine: &SearchEngine,
    product_url: String,
    target_price: f64,
    notification_sent: bool,
) -> anyhow::Result<()> {
    if !(target_price.is_finite() && target_price > 0.0) {
        anyhow::bail!("--target must be a positive price, got {target_price}");
    }
    let alert = PriceAlert {
        product_url,
        target_price,
        notification_sent,
    };
    let observed = engine.observe_price(&alert.product_url).await;
    let decision = evaluate_alert(&alert, observed);

    let mut body = serde_json::to_value(decision)?;
    if let Some(map) = body.as_object_mut() {
        map.insert("url".to_string(), json!(alert.product_url));
        map.insert("target".to_string(), json!(alert.target_price));
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
