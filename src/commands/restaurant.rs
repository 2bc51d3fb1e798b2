use clap::{Args, Subcommand};
use serde_json::{json, Value};

use super::OutputFormat;
use restaurant_picker::{Catalog, DocumentStore};

#[derive(Args)]
pub struct RestaurantCommand {
    #[command(subcommand)]
    pub command: RestaurantSubcommand,
}

#[derive(Subcommand)]
pub enum RestaurantSubcommand {
    /// List all restaurants
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a restaurant
    Add {
        /// Name of the restaurant
        name: String,

        /// Numeric restaurant ID
        #[arg(long)]
        id: Option<i64>,

        /// Food type (can be repeated)
        #[arg(long = "food", value_name = "FOOD")]
        food_types: Vec<String>,

        /// Service type: takeout, delivery, dine-in or at-home (can be repeated)
        #[arg(long = "service", value_name = "SERVICE")]
        service_types: Vec<String>,

        /// Profile ID the restaurant belongs to (can be repeated)
        #[arg(long = "profile", value_name = "PROFILE")]
        profiles: Vec<String>,
    },

    /// Remove a restaurant
    Remove {
        /// Restaurant ID
        id: i64,
    },
}

impl RestaurantCommand {
    pub async fn run<S: DocumentStore>(
        &self,
        catalog: &Catalog<S>,
        credential: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            RestaurantSubcommand::List { format } => {
                let restaurants = catalog.list_restaurants().await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&restaurants)?);
                    }
                    OutputFormat::Text => {
                        if restaurants.is_empty() {
                            println!("No restaurants found");
                            return Ok(());
                        }
                        println!("{:<8}  {:<30}  {:<24}  SERVICE", "ID", "NAME", "FOOD");
                        println!("{}", "-".repeat(80));
                        for restaurant in &restaurants {
                            let id = restaurant
                                .id()
                                .map(|id| id.to_string())
                                .unwrap_or_else(|| "-".to_string());
                            println!(
                                "{:<8}  {:<30}  {:<24}  {}",
                                id,
                                truncate(restaurant.name(), 30),
                                truncate(&restaurant.food_types().join(", "), 24),
                                restaurant.service_types().join(", ")
                            );
                        }
                        println!("\nTotal: {} restaurant(s)", restaurants.len());
                    }
                }
                Ok(())
            }

            RestaurantSubcommand::Add {
                name,
                id,
                food_types,
                service_types,
                profiles,
            } => {
                let record = restaurant_record(*id, name, food_types, service_types, profiles);
                let created = catalog.add_restaurant(record, credential).await?;
                println!("Added restaurant:");
                println!("{}", created);
                Ok(())
            }

            RestaurantSubcommand::Remove { id } => {
                let removed = catalog.delete_restaurant(*id, credential).await?;
                println!("Removed restaurant: {}", removed.name());
                Ok(())
            }
        }
    }
}

/// JSON record in the same shape an HTTP client would submit.
fn restaurant_record(
    id: Option<i64>,
    name: &str,
    food_types: &[String],
    service_types: &[String],
    profiles: &[String],
) -> Value {
    let mut record = json!({
        "name": name.trim(),
        "foodTypes": food_types,
        "serviceTypes": service_types,
    });
    if let Some(id) = id {
        record["id"] = json!(id);
    }
    if !profiles.is_empty() {
        record["profiles"] = json!(profiles);
    }
    record
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width - 3).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
