use clap::{Parser, Subcommand};
use lib::assistant::Assistant;
use lib::gateway::{SimulateParams, SimulateReply};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "torcida")]
#[command(about = "Torcida CLI: football chat assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and default files (config.json and the bundled catalog.json).
    Init {
        /// Config file path (default: TORCIDA_CONFIG_PATH or ~/.torcida/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the gateway (webhook, simulation and admin routes on one HTTP port).
    Gateway {
        /// Config file path (default: TORCIDA_CONFIG_PATH or ~/.torcida/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 15151)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Chat with the assistant (interactive). Uses the running gateway unless --offline.
    Chat {
        /// Config file path (default: TORCIDA_CONFIG_PATH or ~/.torcida/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// User id the messages are sent as.
        #[arg(long, default_value = "cli-user")]
        user: String,

        /// Answer in-process instead of going through the gateway.
        #[arg(long)]
        offline: bool,
    },

    /// Classify one message and print the result as JSON.
    Classify {
        /// Config file path (default: TORCIDA_CONFIG_PATH or ~/.torcida/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Message text.
        text: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("torcida {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat {
            config,
            user,
            offline,
        }) => {
            if let Err(e) = run_chat(config, user, offline).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Classify { config, text }) => {
            if let Err(e) = run_classify(config, text).await {
                log::error!("classify failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("starting gateway on {}:{}", config.gateway.bind, config.gateway.port);
    lib::gateway::run_gateway(config, path).await
}

async fn offline_assistant(config_path: Option<PathBuf>) -> anyhow::Result<Assistant> {
    let (config, path) = lib::config::load_config(config_path)?;
    lib::init::require_initialized(&path, &config)?;
    Assistant::from_config(&config, &path).await
}

async fn run_chat(config_path: Option<PathBuf>, user: String, offline: bool) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let assistant = if offline {
        Some(offline_assistant(config_path.clone()).await?)
    } else {
        None
    };
    let (config, _) = lib::config::load_config(config_path)?;
    let simulate_url = format!(
        "http://{}:{}/simulate",
        config.gateway.bind.trim(),
        config.gateway.port
    );
    let client = reqwest::Client::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }

        let reply = match &assistant {
            Some(a) => Ok(a.process_message(&user, input, None).await),
            None => turn_via_gateway(&client, &simulate_url, &user, input).await,
        };
        match reply {
            Ok(reply) => println!("< {}", reply.trim()),
            Err(e) => eprintln!("chat error: {}", e),
        }
    }

    Ok(())
}

async fn turn_via_gateway(
    client: &reqwest::Client,
    url: &str,
    user: &str,
    message: &str,
) -> Result<String, String> {
    let params = SimulateParams {
        user_id: user.to_string(),
        message: message.to_string(),
        name: None,
    };
    let res = client
        .post(url)
        .json(&params)
        .send()
        .await
        .map_err(|e| format!("gateway unreachable at {} ({}); is `torcida gateway` running?", url, e))?;
    if !res.status().is_success() {
        return Err(format!("gateway returned {}", res.status()));
    }
    let body: SimulateReply = res.json().await.map_err(|e| e.to_string())?;
    Ok(body.reply)
}

async fn run_classify(config_path: Option<PathBuf>, text: String) -> anyhow::Result<()> {
    let assistant = offline_assistant(config_path).await?;
    let result = assistant.classifier().classify(&text).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
