use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use courier_engine::{build_provider, EngineConfig, LoopOutcome, ProviderKind, ToolLoop, TracingSink};
use courier_shared::toolbelts;
use courier_shared::ToolRegistry;

const DEMO_QUERIES: [(&str, &str); 4] = [
    ("Weather query", "What's the weather like in Paris?"),
    (
        "Multiple tools",
        "What's the weather in Tokyo and London? Also, what is 42 * 17 + 3?",
    ),
    ("No tool needed", "What is the capital of France?"),
    (
        "Fragile date tool",
        "Show me the restaurant bookings for March 15th, 2025",
    ),
];

#[derive(Parser)]
#[command(name = "courier", version, about = "Tool-calling loop over a chat-completion model")]
struct Cli {
    /// JSON config file; environment variables still override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    provider: Option<ProviderKind>,

    #[arg(long, global = true)]
    model: Option<String>,

    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    #[arg(long, global = true, value_enum, default_value_t = ToolbeltChoice::Default)]
    toolbelt: ToolbeltChoice,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one question through the loop and print the answer
    Ask { message: String },
    /// Run the canned example queries
    Demo,
    /// Print the tool definitions sent to the model
    Tools,
}

#[derive(Clone, Copy, ValueEnum)]
enum ToolbeltChoice {
    Default,
    Kitchen,
    All,
}

impl ToolbeltChoice {
    fn registry(self) -> Result<ToolRegistry> {
        let registry = match self {
            ToolbeltChoice::Default => toolbelts::default_registry(),
            ToolbeltChoice::Kitchen => toolbelts::kitchen_registry(),
            ToolbeltChoice::All => toolbelts::full_registry(),
        };
        Ok(registry?)
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "courier=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("courier: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  caused by: {}", cause);
            }
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let registry = cli.toolbelt.registry()?;

    if let Command::Tools = cli.command {
        println!("{}", serde_json::to_string_pretty(&registry.tools())?);
        return Ok(0);
    }

    let config = load_config(&cli)?;
    let provider = build_provider(&config)?;
    info!(provider = provider.name(), model = config.model(), "provider ready");

    let engine = ToolLoop::new(config, provider, Arc::new(registry))?.with_sink(Arc::new(TracingSink));

    match cli.command {
        Command::Ask { message } => {
            let outcome = engine.ask(&message).await?;
            println!("{}", outcome);
            Ok(if outcome.is_answer() { 0 } else { 2 })
        }
        Command::Demo => {
            for (index, (title, query)) in DEMO_QUERIES.iter().enumerate() {
                println!("\n--- Example {}: {} ---", index + 1, title);
                println!("Q: {}", query);
                match engine.ask(query).await? {
                    LoopOutcome::Answer(text) => println!("A: {}", text),
                    exhausted => println!("A: {}", exhausted),
                }
            }
            Ok(0)
        }
        Command::Tools => Ok(0),
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config from '{}'", path.display()))?,
        None => EngineConfig::from_env()?,
    };

    if let Some(provider) = cli.provider {
        if provider != config.provider {
            // the key read from the environment belongs to the previous provider
            config.api_key = std::env::var("COURIER_API_KEY")
                .ok()
                .or_else(|| provider.api_key_var().and_then(|var| std::env::var(var).ok()));
        }
        config.provider = provider;
    }
    if let Some(model) = &cli.model {
        config.model = Some(model.clone());
    }
    if let Some(max_iterations) = cli.max_iterations {
        config.max_iterations = max_iterations;
    }

    config.validate()?;
    Ok(config)
}
