//! Server command implementation

use anyhow::Result;
use recur_core::DetectionConfig;
use recur_server::ServerConfig;

/// Split a comma-separated environment variable into trimmed, non-empty values
pub fn env_list(name: &str) -> Vec<String> {
    parse_list(&std::env::var(name).unwrap_or_default())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub async fn cmd_serve(
    host: &str,
    port: u16,
    no_auth: bool,
    detection: DetectionConfig,
) -> Result<()> {
    println!("🚀 Starting Recur web server...");
    println!("   Listening: http://{}:{}", host, port);

    // Parse API keys from environment (comma-separated)
    let api_keys = env_list("RECUR_API_KEYS");
    let allowed_origins = env_list("RECUR_ALLOWED_ORIGINS");

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else if api_keys.is_empty() {
        println!("   🔒 Authentication: enabled, but RECUR_API_KEYS is empty");
        println!("      Every API request will be rejected until a key is configured");
    } else {
        println!(
            "   🔑 API keys: {} configured (RECUR_API_KEYS)",
            api_keys.len()
        );
    }
    if !allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", allowed_origins.join(", "));
    }

    let config = ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_keys,
        ..Default::default()
    };

    recur_server::serve_with_config(host, port, detection, config).await
}
