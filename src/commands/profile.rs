use clap::{Args, Subcommand};
use serde_json::json;

use super::OutputFormat;
use restaurant_picker::{Catalog, DocumentStore};

#[derive(Args)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub command: ProfileSubcommand,
}

#[derive(Subcommand)]
pub enum ProfileSubcommand {
    /// List all profiles
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a profile
    Add {
        /// Profile ID
        id: String,

        /// Display name
        name: String,
    },

    /// Remove a profile
    Remove {
        /// Profile ID
        id: String,
    },
}

impl ProfileCommand {
    pub async fn run<S: DocumentStore>(
        &self,
        catalog: &Catalog<S>,
        credential: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ProfileSubcommand::List { format } => {
                let profiles = catalog.list_profiles().await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&profiles)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<20}  NAME", "ID");
                        println!("{}", "-".repeat(50));
                        for profile in &profiles {
                            let marker = if profile.is_default() { "  (default)" } else { "" };
                            println!("{:<20}  {}{}", profile.id(), profile.name(), marker);
                        }
                    }
                }
                Ok(())
            }

            ProfileSubcommand::Add { id, name } => {
                let record = json!({ "id": id.trim(), "name": name.trim() });
                let created = catalog.add_profile(record, credential).await?;
                println!("Added profile: {}", created);
                Ok(())
            }

            ProfileSubcommand::Remove { id } => {
                let removed = catalog.delete_profile(id, credential).await?;
                println!("Removed profile: {}", removed);
                Ok(())
            }
        }
    }
}
