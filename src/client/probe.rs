use anyhow::{Context, Result};
use fee_oracle::{
    client::OracleClient,
    models::{Chain, TxType, Urgency},
    services::fee_estimator::NEUTRAL_FAILURE_TOLERANCE,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let base_url = std::env::var("FEE_ORACLE_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());
    let chain: Chain = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ethereum".to_string())
        .parse()
        .map_err(anyhow::Error::msg)
        .context("Usage: oracle-probe [chain]")?;

    println!("Fee Oracle Probe");
    println!("================");
    println!("Server: {}", base_url);
    println!("Chain:  {}", chain);
    println!();

    let client = OracleClient::new(&base_url)?;

    match client.health().await {
        Ok(health) => println!("[OK] Server is {} (v{})", health.status, health.version),
        Err(e) => println!("[FAILED] Health check: {}", e),
    }
    println!();

    for urgency in [Urgency::Low, Urgency::Medium, Urgency::High, Urgency::Urgent] {
        match client
            .estimate(chain, urgency, TxType::Transfer, NEUTRAL_FAILURE_TOLERANCE)
            .await
        {
            Ok(response) => {
                let report = response.data;
                println!(
                    "[{:>6}] max_fee={} wei  tip={} wei  ~${:.6}  (confidence {:.2}, cache_hit={})",
                    urgency,
                    report.estimate.recommended_max_fee,
                    report.estimate.priority_fee,
                    report.cost_usd,
                    report.confidence.score,
                    response.cache_hit
                );
            }
            Err(e) => println!("[FAILED] {} estimate: {}", urgency, e),
        }
    }
    println!();

    match client.forecast(chain, 10).await {
        Ok(response) => {
            println!("Inclusion forecast (trend: {:?}):", response.data.trend);
            for point in &response.data.curve {
                println!(
                    "   block {:>3}: p={:.3}  max_fee={} wei",
                    point.target_block, point.inclusion_probability, point.max_fee
                );
            }
        }
        Err(e) => println!("[FAILED] Forecast: {}", e),
    }
    println!();

    match client.congestion(chain).await {
        Ok(response) => {
            println!("Congestion:");
            println!("{}", serde_json::to_string_pretty(&response.data)?);
        }
        Err(e) => println!("[FAILED] Congestion: {}", e),
    }

    Ok(())
}
