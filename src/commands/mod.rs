use clap::ValueEnum;

mod profile;
mod restaurant;

pub use profile::ProfileCommand;
pub use restaurant::RestaurantCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
