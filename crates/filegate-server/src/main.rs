//! Filegate - HTTP file gateway over an S3 bucket

use clap::Parser;
use filegate_server::{run_server_with_shutdown, shutdown_signal, GatewayConfig, StoreBackend};
use filegate_store::{Credentials, S3Config};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "filegate")]
#[command(about = "List, download and upload files in an S3-compatible bucket over HTTP")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "FILEGATE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "PORT")]
    port: u16,

    /// Bucket to serve
    #[arg(short, long, env = "AWS_S3_BUCKET_NAME")]
    bucket: Option<String>,

    /// Object store region
    #[arg(long, default_value = "us-east-1", env = "AWS_REGION")]
    region: String,

    /// Object store endpoint (defaults to the AWS regional endpoint)
    #[arg(long, env = "S3_ENDPOINT")]
    endpoint: Option<String>,

    /// Use virtual-hosted-style bucket addressing instead of path-style
    #[arg(long, env = "S3_VIRTUAL_HOSTED_STYLE")]
    virtual_hosted_style: bool,

    /// Access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    access_key_id: Option<String>,

    /// Secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    /// Session token for temporary credentials
    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,

    /// Object store request timeout in seconds
    #[arg(long, default_value = "30", env = "S3_TIMEOUT_SECS")]
    timeout_secs: u64,

    /// Use in-memory storage (for testing, data will not persist)
    #[arg(long, env = "FILEGATE_MEMORY_STORE")]
    memory_store: bool,

    /// Maximum request body size in bytes
    #[arg(long, default_value = "104857600", env = "FILEGATE_MAX_BODY_SIZE")]
    max_body_size: usize,

    /// Disable CORS headers
    #[arg(long, env = "FILEGATE_NO_CORS")]
    no_cors: bool,

    /// Enable debug logging
    #[arg(short, long, env = "FILEGATE_DEBUG")]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, env = "FILEGATE_LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn store_backend(&self) -> anyhow::Result<StoreBackend> {
        if self.memory_store {
            return Ok(StoreBackend::Memory);
        }

        let mut s3 = match &self.endpoint {
            Some(endpoint) => S3Config::new(endpoint).with_region(&self.region),
            None => S3Config::for_region(&self.region),
        }
        .with_timeout(Duration::from_secs(self.timeout_secs));

        if self.virtual_hosted_style {
            s3 = s3.with_virtual_hosted_style();
        }

        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => {
                let mut credentials = Credentials::new(id, secret);
                if let Some(token) = &self.session_token {
                    credentials = credentials.with_session_token(token);
                }
                s3 = s3.with_credentials(credentials);
            }
            (None, None) => {}
            _ => anyhow::bail!(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
            ),
        }

        Ok(StoreBackend::S3(s3))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "filegate={level},filegate_server={level},filegate_store={level},tower_http=debug",
            level = log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Filegate on {}:{}", args.host, args.port);

    if args.memory_store {
        tracing::warn!("⚠️  Using in-memory storage - data will NOT persist!");
    }

    // Build configuration
    let config = GatewayConfig {
        host: args.host.clone(),
        port: args.port,
        bucket: args.bucket.clone(),
        store: args.store_backend()?,
        max_body_size: args.max_body_size,
        cors_enabled: !args.no_cors,
        ..Default::default()
    };

    // Run the server
    run_server_with_shutdown(config, shutdown_signal()).await
}
