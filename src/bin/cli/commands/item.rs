use clap::Subcommand;
use serde_json::Value;
use stockroom::dto::{ItemDto, ItemListQuery, NamedRefDto};

use crate::client::StockroomClient;
use crate::output::{self, OutputConfig};

/// Item management commands
#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// List items
    List {
        /// Case-insensitive exact name match
        #[clap(long)]
        search: Option<String>,
        /// Filter by category ID
        #[clap(long)]
        category: Option<i32>,
        /// Field to order by; prefix with `-` for descending
        #[clap(long, allow_hyphen_values = true)]
        ordering: Option<String>,
    },
    /// Create a new item
    Create {
        #[clap(long)]
        sku: String,
        #[clap(long)]
        name: String,
        /// Name of an existing category
        #[clap(long)]
        category: String,
        /// Tag name; repeat for several tags. Missing tags are created
        #[clap(long = "tag")]
        tags: Vec<String>,
        /// Mark the item as out of stock
        #[clap(long)]
        out_of_stock: bool,
        /// Available stock, e.g. 15 or 12.50
        #[clap(long, default_value = "0")]
        stock: String,
    },
    /// Get a specific item by ID
    Get {
        id: i32,
    },
    /// Update an existing item; only the given fields change
    Update {
        id: i32,
        #[clap(long)]
        sku: Option<String>,
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        category: Option<String>,
        /// Replaces all tags; repeat for several tags
        #[clap(long = "tag")]
        tags: Option<Vec<String>>,
        #[clap(long)]
        in_stock: Option<bool>,
        #[clap(long)]
        stock: Option<String>,
    },
    /// Delete an item
    Delete {
        id: i32,
    },
}

fn tag_refs(names: Vec<String>) -> Vec<NamedRefDto> {
    names.into_iter().map(NamedRefDto::named).collect()
}

/// Executes an item command
pub async fn execute(
    client: &StockroomClient,
    cmd: ItemCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ItemCommands::List { search, category, ordering } => {
            let query = ItemListQuery {
                search,
                category: category.map(|id| id.to_string()),
                ordering,
            };
            let items = client.list_items(&query).await?;
            output::print_items(&items, config);
        }
        ItemCommands::Create {
            sku,
            name,
            category,
            tags,
            out_of_stock,
            stock,
        } => {
            let dto = ItemDto {
                sku: Some(sku),
                name: Some(name),
                category: Some(NamedRefDto::named(category)),
                tags: Some(tag_refs(tags)),
                in_stock: Some(!out_of_stock),
                available_stock: Some(Value::String(stock)),
            };
            let item = client.create_item(&dto).await?;
            output::print_item(&item, config);
        }
        ItemCommands::Get { id } => {
            let item = client.get_item(id).await?;
            output::print_item(&item, config);
        }
        ItemCommands::Update {
            id,
            sku,
            name,
            category,
            tags,
            in_stock,
            stock,
        } => {
            let dto = ItemDto {
                sku,
                name,
                category: category.map(NamedRefDto::named),
                tags: tags.map(tag_refs),
                in_stock,
                available_stock: stock.map(Value::String),
            };
            let item = client.update_item(id, &dto).await?;
            output::print_item(&item, config);
        }
        ItemCommands::Delete { id } => {
            client.delete_item(id).await?;
            output::print_success(&format!("Deleted item {}", id), config);
        }
    }
    Ok(())
}
