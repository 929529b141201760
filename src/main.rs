#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::needless_pass_by_value,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use honeypot::config::Config;
use honeypot::gateway::{self, HoneypotReply, InboundMessage};
use honeypot::persona;
use honeypot::security;
use std::io::Write;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CompletionShell {
    #[value(name = "bash")]
    Bash,
    #[value(name = "fish")]
    Fish,
    #[value(name = "zsh")]
    Zsh,
    #[value(name = "powershell")]
    PowerShell,
    #[value(name = "elvish")]
    Elvish,
}

/// `honeypot` - a naive chat persona that keeps scammers busy.
#[derive(Parser, Debug)]
#[command(name = "honeypot")]
#[command(version)]
#[command(about = "A naive chat persona that keeps scammers busy.", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway
    #[command(long_about = "\
Start the HTTP gateway.

Serves GET / and GET /honeypot (health) and POST / and POST /honeypot \
(persona replies). Bind address defaults to the values in your config \
file (gateway.host / gateway.port).

Examples:
  honeypot serve                  # use config defaults
  honeypot serve -p 8080          # listen on port 8080
  honeypot serve --host 0.0.0.0   # bind to all interfaces
  honeypot serve -p 0             # random available port")]
    Serve {
        /// Port to listen on (use 0 for random available port); defaults to config gateway.port
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to; defaults to config gateway.host
        #[arg(long)]
        host: Option<String>,
    },

    /// Show effective configuration
    Status,

    /// Run the persona offline against a single message
    #[command(long_about = "\
Run the persona offline against a single message.

Prints the JSON body the gateway would return for a session at the given \
interaction count. No server is contacted and no session state is kept.

Examples:
  honeypot probe \"your account is blocked, verify now\"
  honeypot probe \"please share the otp code\" --count 4")]
    Probe {
        /// Message text as a scammer would send it
        message: String,

        /// Session id to report in logs
        #[arg(long)]
        session: Option<String>,

        /// Interaction count to assume for the session
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },

    /// Generate shell completion script to stdout
    #[command(long_about = "\
Generate shell completion scripts for `honeypot`.

Examples:
  source <(honeypot completions bash)
  honeypot completions zsh > ~/.zfunc/_honeypot")]
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Dump the full configuration JSON Schema to stdout
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(config_dir) = &cli.config_dir {
        if config_dir.trim().is_empty() {
            bail!("--config-dir cannot be empty");
        }
        std::env::set_var("HONEYPOT_CONFIG_DIR", config_dir);
    }

    // Completions must remain stdout-only and should not load config or initialize logging.
    if let Commands::Completions { shell } = &cli.command {
        let mut stdout = std::io::stdout().lock();
        write_shell_completion(*shell, &mut stdout)?;
        return Ok(());
    }

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Commands::Config {
        config_command: ConfigCommands::Schema,
    } = &cli.command
    {
        let schema = schemars::schema_for!(Config);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let config = Config::load_or_init().await?;

    match cli.command {
        Commands::Completions { .. } | Commands::Config { .. } => unreachable!(),

        Commands::Serve { port, host } => {
            let port = port.unwrap_or(config.gateway.port);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            if port == 0 {
                info!("Starting honeypot gateway on {host} (random port)");
            } else {
                info!("Starting honeypot gateway on {host}:{port}");
            }
            gateway::run_gateway(&host, port, config).await
        }

        Commands::Status => {
            print_status(&config);
            Ok(())
        }

        Commands::Probe {
            message,
            session,
            count,
        } => {
            let reply = probe_reply(&config, &message, session.as_deref(), count);
            println!("{}", serde_json::to_string_pretty(&reply)?);
            Ok(())
        }
    }
}

fn print_status(config: &Config) {
    let persona = &config.persona;
    println!("honeypot status");
    println!();
    println!("Version:     {}", env!("CARGO_PKG_VERSION"));
    println!("Config:      {}", config.config_path.display());
    println!(
        "Gateway:     {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("API key:     {}", security::redact(config.effective_api_key()));
    println!();
    println!("Persona:");
    println!("  Default session:  {}", persona.default_session_id);
    println!("  Scam keywords:    {}", persona.scam_keywords.join(", "));
    println!("  OTP triggers:     {}", persona.otp_triggers.join(", "));
    println!("  Link triggers:    {}", persona.link_triggers.join(", "));
    println!("  Helper after:     {} messages", persona.helper_after_messages);
    println!(
        "  Reply pools:      confused={} helper={} otp={} link={}",
        persona.replies.confused.len(),
        persona.replies.helper.len(),
        persona.replies.otp.len(),
        persona.replies.link.len()
    );
}

/// What the gateway would answer for `message` at interaction `count`.
fn probe_reply(config: &Config, message: &str, session: Option<&str>, count: u64) -> HoneypotReply {
    let body = serde_json::json!({
        "sessionId": session.unwrap_or(""),
        "message": message,
    });
    let inbound = InboundMessage::normalize(&body, &config.persona.default_session_id);
    let responder = persona::create_responder(&config.persona);
    let verdict = responder.respond(&inbound.text, count);

    info!(
        session = %inbound.session_id,
        count,
        category = verdict.category.as_str(),
        "probe"
    );

    HoneypotReply::success(verdict.scam_detected, count, verdict.reply)
}

fn write_shell_completion<W: Write>(shell: CompletionShell, writer: &mut W) -> Result<()> {
    use clap_complete::generate;
    use clap_complete::shells;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, bin_name.clone(), writer),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, bin_name.clone(), writer),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, bin_name.clone(), writer),
        CompletionShell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, bin_name.clone(), writer);
        }
        CompletionShell::Elvish => generate(shells::Elvish, &mut cmd, bin_name, writer),
    }

    writer.flush()?;
    Ok(())
}
