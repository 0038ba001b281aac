mod api;
mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use umlscan_assistant::providers::{OllamaAssistant, OpenRouterAssistant};
use umlscan_assistant::{ResponseBuilder, ScanRequest};
use umlscan_core::{DiagramAssistant, DiagramContext, ExtractionBackend};
use umlscan_media::{validate_upload, ImageUpload, UploadLimits};
use umlscan_understanding::{
    CompositeExtractor, DiagramScanner, OcrExtractor, VisionExtractor, VisionProvider,
};

use api::AppState;
use config::Config;

#[derive(Parser)]
#[command(name = "umlscan")]
#[command(about = "UML class diagram scanner and modeling assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Scan a diagram image and print the suggestions as JSON
    Scan {
        /// Path to a PNG, JPEG, GIF, BMP or WEBP image
        image: PathBuf,
        /// JSON file with the diagram currently open in the editor
        #[arg(short, long)]
        context: Option<PathBuf>,
        /// Print the normalized scan result instead of the assistant response
        #[arg(long)]
        raw: bool,
    },
    /// Query a running server's health endpoint
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            init_logging(&config);
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Scan {
            image,
            context,
            raw,
        } => {
            // stdout carries the JSON result; only file logging here
            if let Some(dir) = &config.log_dir {
                umlscan_logging::init_logger(dir, &config.log_level);
            }
            run_scan(&config, &image, context.as_deref(), raw).await?;
        }
        Commands::Status => {
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("umlscan is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    match &config.log_dir {
        Some(dir) => umlscan_logging::init_logger(dir, &config.log_level),
        None => umlscan_logging::init_console_logger(&config.log_level),
    }
}

/// Every extraction backend the environment has credentials for.
fn extraction_backend(config: &Config) -> CompositeExtractor {
    let mut composite = CompositeExtractor::new();

    let vision = match (&config.openai_api_key, &config.gemini_api_key) {
        (Some(key), _) => Some(VisionProvider::openai(key)),
        (None, Some(key)) => Some(VisionProvider::gemini(key)),
        (None, None) => None,
    };
    if let Some(mut provider) = vision {
        if let Some(model) = &config.vision_model {
            provider = provider.with_model(model);
        }
        composite = composite.with_backend(Arc::new(VisionExtractor::new(provider)));
        info!("Registered vision extraction backend");
    }

    if let Some(url) = &config.ocr_url {
        composite = composite.with_backend(Arc::new(OcrExtractor::new(url)));
        info!(url = %url, "Registered OCR extraction backend");
    }

    if composite.is_empty() {
        warn!("No extraction backend configured; scans will report the service as unavailable");
    }
    composite
}

fn assistant(config: &Config) -> Option<Arc<dyn DiagramAssistant>> {
    if let Some(api_key) = &config.openrouter_api_key {
        info!(model = %config.assistant_model, "Registered OpenRouter assistant");
        let mut assistant = OpenRouterAssistant::new(api_key, &config.assistant_model);
        if let Some(frontend) = &config.frontend_url {
            assistant = assistant.with_referer(frontend);
        }
        return Some(Arc::new(assistant));
    }
    if let Some(url) = &config.ollama_url {
        info!(url = %url, model = %config.assistant_model, "Registered Ollama assistant");
        return Some(Arc::new(
            OllamaAssistant::new(&config.assistant_model).with_base_url(url),
        ));
    }
    None
}

fn response_builder(config: &Config, backend: Arc<dyn ExtractionBackend>) -> ResponseBuilder {
    let scanner = DiagramScanner::new(backend).with_timeout(config.backend_timeout);
    let builder = ResponseBuilder::new(scanner, config.locale)
        .with_assistant_timeout(config.backend_timeout);
    match assistant(config) {
        Some(assistant) => builder.with_assistant(assistant),
        None => builder,
    }
}

/// Origins of the editor's dev server, always allowed.
const DEV_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

fn cors_origins(config: &Config) -> Result<Vec<HeaderValue>> {
    let mut origins: Vec<HeaderValue> = DEV_ORIGINS
        .into_iter()
        .map(HeaderValue::from_static)
        .collect();
    if let Some(origin) = &config.frontend_url {
        origins.push(
            origin
                .trim_end_matches('/')
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid FRONTEND_URL: {origin}"))?,
        );
    }
    Ok(origins)
}

fn cors(config: &Config) -> Result<CorsLayer> {
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(cors_origins(config)?))
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        locale = ?config.locale,
        timeout_secs = config.backend_timeout.as_secs(),
        "Starting umlscan"
    );

    let composite = extraction_backend(&config);
    let backends = composite.names();
    let builder = response_builder(&config, Arc::new(composite));

    let state = Arc::new(AppState {
        builder,
        limits: UploadLimits {
            max_bytes: config.max_upload_bytes,
        },
        backends,
    });

    let app = api::build_router(state).layer(cors(&config)?);
    let addr = format!("{}:{}", config.bind_address, config.port);

    info!(addr = %addr, "HTTP API listening");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_scan(config: &Config, image: &Path, context: Option<&Path>, raw: bool) -> Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("reading {}", image.display()))?;
    let upload = ImageUpload::new(bytes).with_filename(image.to_string_lossy());
    let validated = validate_upload(
        Some(upload),
        UploadLimits {
            max_bytes: config.max_upload_bytes,
        },
    );

    let context: Option<DiagramContext> = match context {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            Some(serde_json::from_str(&text).context("diagram context is not valid JSON")?)
        }
        None => None,
    };

    let builder = response_builder(config, Arc::new(extraction_backend(config)));

    if raw {
        let result = builder.scanner().scan_diagram_image(&validated?).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let mut request = ScanRequest::from(validated);
    request.context = context;
    let outcome = builder.scan(request).await;
    println!("{}", serde_json::to_string_pretty(&outcome.response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_url_is_added_to_dev_origins() {
        let config = Config {
            frontend_url: Some("https://uml.example.com/".to_string()),
            ..Config::default()
        };
        let origins = cors_origins(&config).unwrap();
        assert_eq!(origins.len(), 3);
        assert_eq!(origins[0], "http://localhost:5173");
        assert_eq!(origins[1], "http://127.0.0.1:5173");
        assert_eq!(origins[2], "https://uml.example.com");
    }

    #[test]
    fn dev_origins_without_frontend_url() {
        let origins = cors_origins(&Config::default()).unwrap();
        assert_eq!(origins.len(), 2);
    }
}
