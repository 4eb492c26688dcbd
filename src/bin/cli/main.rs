mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use client::StockroomClient;
use output::{OutputConfig, OutputFormat};
use std::process;
use stockroom::config;

/// CLI for the Stockroom inventory server
#[derive(Parser, Debug)]
#[clap(name = "stockroom-cli", about = "CLI for the Stockroom inventory server")]
struct Cli {
    /// Server URL to connect to
    #[clap(long, env = "STOCKROOM_URL", global = true)]
    server_url: Option<String>,

    /// API token from `login` or `register`
    #[clap(long, env = "STOCKROOM_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs or tokens)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account and print its token
    Register {
        #[clap(long)]
        username: String,
        #[clap(long)]
        email: String,
        #[clap(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in with a username or email and print a token
    Login {
        /// Username or email address
        #[clap(long)]
        username: String,
        #[clap(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Revoke the current token
    Logout,
    /// Reset a forgotten password
    #[command(subcommand)]
    PasswordReset(commands::auth::PasswordResetCommands),
    /// Manage items
    #[command(subcommand)]
    Item(commands::item::ItemCommands),
    /// Manage categories
    #[command(subcommand)]
    Category(commands::category::CategoryCommands),
    /// Manage tags
    #[command(subcommand)]
    Tag(commands::tag::TagCommands),
}

/// Resolves the server URL from CLI args, config file, or defaults
///
/// Precedence: CLI flag / env var > config file > default
fn resolve_server_url(cli_url: Option<String>) -> String {
    if let Some(url) = cli_url {
        return url;
    }

    let config_path = config::get_config_dir_path().map(|dir| dir.join(config::CONFIG_FILE_NAME));
    if let Ok(update) = config::config_from_file(config_path) {
        if let Some(url) = update.server_url {
            return url;
        }
    }

    let defaults = config::base_config(None);
    format!("http://{}", defaults.bind_address())
}

/// Formats an error for human-readable stderr output
fn format_error(err: &dyn std::error::Error) -> String {
    let err_string = err.to_string();

    if err_string.contains("error sending request")
        || err_string.contains("connection refused")
        || err_string.contains("Connection refused")
        || err_string.contains("tcp connect error")
    {
        return format!("Could not connect to server. Is stockroom running?\n  {}", err_string);
    }

    err_string
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let server_url = resolve_server_url(cli.server_url);
    let client = StockroomClient::new(server_url, cli.token);
    let output_config = OutputConfig {
        format: cli.format,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Register { username, email, password } => {
            commands::auth::register(&client, username, email, password, &output_config).await
        }
        Commands::Login { username, password } => {
            commands::auth::login(&client, username, password, &output_config).await
        }
        Commands::Logout => commands::auth::logout(&client, &output_config).await,
        Commands::PasswordReset(cmd) => commands::auth::execute_password_reset(&client, cmd, &output_config).await,
        Commands::Item(cmd) => commands::item::execute(&client, cmd, &output_config).await,
        Commands::Category(cmd) => commands::category::execute(&client, cmd, &output_config).await,
        Commands::Tag(cmd) => commands::tag::execute(&client, cmd, &output_config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref()));
        process::exit(1);
    }
}
