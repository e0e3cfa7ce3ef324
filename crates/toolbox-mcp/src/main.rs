//! Toolbox MCP Server — entry point.

use clap::{Parser, Subcommand};

use toolbox_mcp::config::load_config;
use toolbox_mcp::prompts::PromptRegistry;
use toolbox_mcp::protocol::ProtocolHandler;
use toolbox_mcp::resources::ResourceRegistry;
use toolbox_mcp::tools::ToolRegistry;
use toolbox_mcp::transport::StdioTransport;
use toolbox_mcp::types::{Implementation, SUPPORTED_PROTOCOL_VERSIONS};

#[derive(Parser)]
#[command(
    name = "toolbox-mcp",
    about = "MCP server with per-session capability negotiation",
    version
)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Start MCP server over HTTP (single-shot and SSE endpoints).
    #[cfg(feature = "sse")]
    ServeHttp {
        /// Listen address. Overrides the configuration file.
        #[arg(long)]
        addr: Option<String>,

        /// Seconds of inactivity before a session is evicted.
        #[arg(long)]
        idle_timeout: Option<u64>,

        /// Seconds between idle sweeps.
        #[arg(long)]
        sweep_interval: Option<u64>,
    },

    /// Print server capabilities as JSON.
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    #[cfg_attr(not(feature = "sse"), allow(unused_mut))]
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let handler = ProtocolHandler::from_config(&config);
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        #[cfg(feature = "sse")]
        Commands::ServeHttp {
            addr,
            idle_timeout,
            sweep_interval,
        } => {
            if let Some(addr) = addr {
                config.addr = addr;
            }
            if let Some(secs) = idle_timeout {
                config.idle_timeout_secs = secs;
            }
            if let Some(secs) = sweep_interval {
                config.sweep_interval_secs = secs;
            }
            config.validate()?;

            let handler = ProtocolHandler::from_config(&config);
            let transport = toolbox_mcp::transport::SseTransport::new(handler, &config);
            transport.run(&config.addr).await?;
        }

        Commands::Info => {
            let capabilities = config.capabilities.server_capabilities();
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": Implementation::server(),
                "protocol_versions": SUPPORTED_PROTOCOL_VERSIONS,
                "capabilities": capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "resources": ResourceRegistry::list_resources()
                    .iter()
                    .map(|r| r.uri.clone())
                    .collect::<Vec<_>>(),
                "prompts": PromptRegistry::list_prompts()
                    .iter()
                    .map(|p| p.name.clone())
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
