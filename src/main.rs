use anyhow::Result;
use clap::Parser;
use imagegen_gateway::api::{serve, AppState};
use imagegen_gateway::models::Config;
use imagegen_gateway::pipeline::ImagePipeline;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "imagegen-gateway")]
#[command(about = "Serve the image generation API")]
struct CliArgs {
    /// Address to listen on, overriding BIND_ADDR.
    #[arg(long, value_name = "ADDR", value_parser = parse_bind_arg)]
    bind: Option<String>,
}

fn parse_bind_arg(input: &str) -> std::result::Result<String, String> {
    input
        .parse::<std::net::SocketAddr>()
        .map(|addr| addr.to_string())
        .map_err(|_| format!("Invalid address '{}'. Expected format: HOST:PORT", input))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imagegen_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting imagegen-gateway");

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if !config.is_configured() {
        warn!("OPENAI_API_KEY is not set; generation requests will fail until it is configured");
    }
    if config.strict_size_validation {
        info!("Strict size validation enabled");
    }

    let pipeline = match ImagePipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Failed to initialize image pipeline: {}", e);
            std::process::exit(1);
        }
    };

    let bind_addr = args.bind.unwrap_or_else(|| config.bind_addr.clone());
    let state = Arc::new(AppState::new(pipeline, config.openai_api_key));

    if let Err(e) = serve(state, &bind_addr).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_bind_arg;

    #[test]
    fn test_parse_bind_arg_valid() {
        assert_eq!(parse_bind_arg("127.0.0.1:8080").unwrap(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_bind_arg_invalid() {
        let err = parse_bind_arg("localhost").unwrap_err();
        assert!(err.contains("HOST:PORT"));
    }
}
