use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Inspect a running storefront-guard frontend", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:5000", env = "GUARD_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show circuit breaker state and failure count
    Status,
    /// Check frontend health
    Health,
    /// Fetch products through the resilience engine
    Products,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Status => "/circuit-breaker/status",
            Commands::Health => "/health",
            Commands::Products => "/api/products",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(url).send().await?;
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: frontend returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
