use clap::Subcommand;
use stockroom::dto::PasswordResetConfirmDto;

use crate::client::StockroomClient;
use crate::output::{self, OutputConfig};

/// Password reset commands
#[derive(Subcommand, Debug)]
pub enum PasswordResetCommands {
    /// Ask for a reset token to be sent to an email address
    Request {
        email: String,
    },
    /// Set a new password using a reset token
    Confirm {
        #[clap(long)]
        email: String,
        #[clap(long)]
        token: String,
        #[clap(long, env = "STOCKROOM_NEW_PASSWORD")]
        password: String,
    },
}

/// Creates an account and prints its token
pub async fn register(
    client: &StockroomClient,
    username: String,
    email: String,
    password: String,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let registered = client.register(username, email, password).await?;
    if !config.quiet {
        output::print_success(&format!("Registered {} <{}>", registered.username, registered.email), config);
    }
    output::print_token(&registered.token, config);
    Ok(())
}

/// Logs in with a username or email and prints the token
pub async fn login(
    client: &StockroomClient,
    username: String,
    password: String,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = client.login(username, password).await?;
    output::print_token(&token.token, config);
    Ok(())
}

/// Revokes the token the client was built with
pub async fn logout(client: &StockroomClient, config: &OutputConfig) -> Result<(), Box<dyn std::error::Error>> {
    let message = client.logout().await?;
    output::print_success(&message.message, config);
    Ok(())
}

/// Executes a password reset command
pub async fn execute_password_reset(
    client: &StockroomClient,
    cmd: PasswordResetCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let message = match cmd {
        PasswordResetCommands::Request { email } => client.request_password_reset(email).await?,
        PasswordResetCommands::Confirm { email, token, password } => {
            let dto = PasswordResetConfirmDto {
                email: Some(email),
                token: Some(token),
                new_password_confirm: Some(password.clone()),
                new_password: Some(password),
            };
            client.confirm_password_reset(&dto).await?
        }
    };
    output::print_success(&message.message, config);
    Ok(())
}
