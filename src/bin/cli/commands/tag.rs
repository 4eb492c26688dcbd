use clap::Subcommand;
use stockroom::dto::TagListQuery;

use crate::client::StockroomClient;
use crate::output::{self, OutputConfig};

/// Tag management commands
#[derive(Subcommand, Debug)]
pub enum TagCommands {
    /// List tags
    List {
        /// Case-insensitive substring of the name
        #[clap(long)]
        search: Option<String>,
    },
    /// Create a new tag
    Create {
        name: String,
    },
    /// Get a specific tag by ID
    Get {
        id: i32,
    },
    /// Rename a tag
    Rename {
        id: i32,
        name: String,
    },
    /// Delete a tag; items keep existing without it
    Delete {
        id: i32,
    },
}

/// Executes a tag command
pub async fn execute(
    client: &StockroomClient,
    cmd: TagCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        TagCommands::List { search } => {
            let tags = client.list_tags(&TagListQuery { search }).await?;
            output::print_tags(&tags, config);
        }
        TagCommands::Create { name } => {
            let tag = client.create_tag(name).await?;
            output::print_tag(&tag, config);
        }
        TagCommands::Get { id } => {
            let tag = client.get_tag(id).await?;
            output::print_tag(&tag, config);
        }
        TagCommands::Rename { id, name } => {
            let tag = client.rename_tag(id, name).await?;
            output::print_tag(&tag, config);
        }
        TagCommands::Delete { id } => {
            client.delete_tag(id).await?;
            output::print_success(&format!("Deleted tag {}", id), config);
        }
    }
    Ok(())
}
