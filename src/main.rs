use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use ideagen::chat::{self, ChatOptions};
use ideagen::config::{GatewayConfig, Provider};
use ideagen::constants;
use ideagen::gateway::Gateway;
use ideagen::session::HistoryMode;
use ideagen::store::{JsonFileStore, SessionStore};
use ideagen::web_server;

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the chat gateway web server.
    Start {
        #[arg(long, default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[arg(long, default_value = "127.0.0.1", help = "Address to bind.")]
        host: IpAddr,
        #[arg(long, value_enum, default_value_t = Provider::Openai, env = "IDEAGEN_PROVIDER")]
        provider: Provider,
        #[arg(long, default_value_t = constants::CHAT_MODEL.clone(), help = "Model name sent to the provider.")]
        model: String,
        #[arg(long, help = "Override the provider's base URL.")]
        base_url: Option<String>,
        #[arg(long, help = "Timeout in seconds for each completion request.")]
        timeout_secs: Option<u64>,
        #[arg(long, help = "Directory with a browser front end to serve.")]
        static_dir: Option<PathBuf>,
    },
    /// Chat with a running gateway from the terminal.
    Chat {
        #[arg(long, default_value_t = constants::GATEWAY_URL.clone(), help = "Gateway base URL.")]
        server: String,
        #[arg(long, value_enum, default_value_t = HistoryMode::LatestOnly)]
        history_mode: HistoryMode,
        #[arg(long, help = "Directory holding chat history and saved ideas.")]
        data_dir: Option<PathBuf>,
    },
    /// Print saved ideas.
    Saved {
        #[arg(long, help = "Directory holding chat history and saved ideas.")]
        data_dir: Option<PathBuf>,
    },
    /// Clear chat history and saved ideas.
    Reset {
        #[arg(long, help = "Directory holding chat history and saved ideas.")]
        data_dir: Option<PathBuf>,
    },
}

fn store_for(data_dir: Option<PathBuf>) -> JsonFileStore {
    JsonFileStore::new(data_dir.unwrap_or_else(|| constants::DATA_DIR.clone()))
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,ideagen=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("ideagen starting with command: {:?}", cli.command);

    match cli.command {
        Commands::Start {
            port,
            host,
            provider,
            model,
            base_url,
            timeout_secs,
            static_dir,
        } => {
            let config = GatewayConfig {
                provider,
                base_url,
                model,
                request_timeout: timeout_secs.map(Duration::from_secs),
                ..GatewayConfig::default()
            };
            let completion = config
                .build_completion_service()
                .context("Failed to initialize completion service")?;
            let gateway = Arc::new(Gateway::new(completion, config.system_prompt.clone()));
            let addr = SocketAddr::new(host, port);

            info!("Starting gateway on {}...", addr);
            let mut web_server_handle = tokio::spawn(async move {
                web_server::start_web_server(addr, gateway, static_dir).await
            });

            let ctrl_c = tokio::signal::ctrl_c();
            // Pin the ctrl_c future to the stack so its address is stable
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, initiating shutdown...");
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(Ok(())) => info!("Web server task completed unexpectedly."),
                        Ok(Err(e)) => {
                            error!("Web server failed: {:#}", e);
                            return Err(e.context("Web server failed"));
                        }
                        Err(e) if e.is_panic() => return Err(anyhow!("Web server task panicked: {:?}", e)),
                        Err(e) => return Err(anyhow!("Web server task failed: {:?}", e)),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Chat {
            server,
            history_mode,
            data_dir,
        } => {
            let options = ChatOptions {
                server,
                data_dir: data_dir.unwrap_or_else(|| constants::DATA_DIR.clone()),
                history_mode,
            };
            chat::run_chat(options).await.context("Chat session failed")?;
        }
        Commands::Saved { data_dir } => {
            let state = store_for(data_dir).load()?;
            if state.saved_ideas.is_empty() {
                println!("No saved ideas yet.");
            }
            for idea in state.saved_ideas {
                println!("- {}", idea);
            }
        }
        Commands::Reset { data_dir } => {
            let store = store_for(data_dir);
            store.clear()?;
            println!("Cleared chat history and saved ideas in {}", store.dir().display());
        }
    }

    Ok(())
}
