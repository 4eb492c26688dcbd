use clap::Subcommand;
use stockroom::dto::CategoryListQuery;

use crate::client::StockroomClient;
use crate::output::{self, OutputConfig};

/// Category management commands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories
    List {
        /// Case-insensitive substring of the name
        #[clap(long)]
        search: Option<String>,
        /// `id` or `name`; prefix with `-` for descending
        #[clap(long, allow_hyphen_values = true)]
        ordering: Option<String>,
    },
    /// Create a new category
    Create {
        name: String,
    },
    /// Get a specific category by ID
    Get {
        id: i32,
    },
    /// Rename a category
    Rename {
        id: i32,
        name: String,
    },
    /// Delete a category and every item in it
    Delete {
        id: i32,
    },
}

/// Executes a category command
pub async fn execute(
    client: &StockroomClient,
    cmd: CategoryCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        CategoryCommands::List { search, ordering } => {
            let categories = client.list_categories(&CategoryListQuery { search, ordering }).await?;
            output::print_categories(&categories, config);
        }
        CategoryCommands::Create { name } => {
            let category = client.create_category(name).await?;
            output::print_category(&category, config);
        }
        CategoryCommands::Get { id } => {
            let category = client.get_category(id).await?;
            output::print_category(&category, config);
        }
        CategoryCommands::Rename { id, name } => {
            let category = client.rename_category(id, name).await?;
            output::print_category(&category, config);
        }
        CategoryCommands::Delete { id } => {
            client.delete_category(id).await?;
            output::print_success(&format!("Deleted category {}", id), config);
        }
    }
    Ok(())
}
