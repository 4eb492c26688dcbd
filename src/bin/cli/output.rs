use clap::ValueEnum;
use serde::Serialize;
use stockroom::models::{Category, Item, Tag};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs or tokens)
    pub quiet: bool,
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

/// Prints `(id, name)` rows under an `ID  NAME` header
fn print_named_rows(rows: &[(i32, String)], empty_message: &str, config: &OutputConfig) {
    if rows.is_empty() {
        if !config.quiet {
            println!("{}", empty_message);
        }
        return;
    }
    if config.quiet {
        for (id, _) in rows {
            println!("{}", id);
        }
        return;
    }
    let id_width = rows.iter().map(|(id, _)| id.to_string().len()).max().unwrap_or(2).max(2);
    println!("{:<width$}  NAME", "ID", width = id_width);
    for (id, name) in rows {
        println!("{:<width$}  {}", id, name, width = id_width);
    }
}

/// Prints a list of items in the specified format
pub fn print_items(items: &[Item], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if items.is_empty() {
                if !config.quiet {
                    println!("No items found.");
                }
                return;
            }
            if config.quiet {
                for item in items {
                    println!("{}", item.get_id());
                }
                return;
            }
            let id_w = items.iter().map(|i| i.get_id().to_string().len()).max().unwrap_or(2).max(2);
            let sku_w = items.iter().map(|i| i.get_sku().len()).max().unwrap_or(3).max(3);
            let name_w = items.iter().map(|i| i.get_name().len()).max().unwrap_or(4).max(4);
            println!(
                "{:<id_w$}  {:<sku_w$}  {:<name_w$}  {:>10}  CATEGORY",
                "ID",
                "SKU",
                "NAME",
                "STOCK",
            );
            for item in items {
                let stock = if item.get_in_stock() {
                    item.get_available_stock().to_string()
                } else {
                    "out".to_string()
                };
                println!(
                    "{:<id_w$}  {:<sku_w$}  {:<name_w$}  {:>10}  {}",
                    item.get_id(),
                    item.get_sku(),
                    item.get_name(),
                    stock,
                    item.get_category().get_name(),
                );
            }
        }
        OutputFormat::Json => print_json(items),
    }
}

/// Prints a single item in the specified format
pub fn print_item(item: &Item, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", item.get_id());
                return;
            }
            let tags: Vec<String> = item.get_tags().iter().map(Tag::get_name).collect();
            println!("ID:        {}", item.get_id());
            println!("SKU:       {}", item.get_sku());
            println!("Name:      {}", item.get_name());
            println!("Category:  {}", item.get_category().get_name());
            println!("Tags:      {}", tags.join(", "));
            println!("In stock:  {}", if item.get_in_stock() { "yes" } else { "no" });
            println!("Available: {}", item.get_available_stock());
        }
        OutputFormat::Json => print_json(item),
    }
}

pub fn print_categories(categories: &[Category], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            let rows: Vec<(i32, String)> = categories.iter().map(|c| (c.get_id(), c.get_name())).collect();
            print_named_rows(&rows, "No categories found.", config);
        }
        OutputFormat::Json => print_json(categories),
    }
}

pub fn print_category(category: &Category, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human if config.quiet => println!("{}", category.get_id()),
        OutputFormat::Human => {
            println!("ID:    {}", category.get_id());
            println!("Name:  {}", category.get_name());
        }
        OutputFormat::Json => print_json(category),
    }
}

pub fn print_tags(tags: &[Tag], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            let rows: Vec<(i32, String)> = tags.iter().map(|t| (t.get_id(), t.get_name())).collect();
            print_named_rows(&rows, "No tags found.", config);
        }
        OutputFormat::Json => print_json(tags),
    }
}

pub fn print_tag(tag: &Tag, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human if config.quiet => println!("{}", tag.get_id()),
        OutputFormat::Human => {
            println!("ID:    {}", tag.get_id());
            println!("Name:  {}", tag.get_name());
        }
        OutputFormat::Json => print_json(tag),
    }
}

/// Prints an API token; quiet mode prints the bare token for use in scripts
pub fn print_token(token: &str, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human if config.quiet => println!("{}", token),
        OutputFormat::Human => {
            println!("Token: {}", token);
            println!("Export it as STOCKROOM_TOKEN or pass it with --token.");
        }
        OutputFormat::Json => print_json(&serde_json::json!({ "token": token })),
    }
}

/// Prints a success message in the specified format
pub fn print_success(message: &str, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if !config.quiet {
                println!("{}", message);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({ "message": message })),
    }
}
