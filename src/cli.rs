use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the storefront API daemon
    Daemon {
        /// Address to listen on
        #[clap(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },

    /// Search the catalog with a free-text query
    Search {
        /// Free-text query, e.g. "chocolate birthday"
        query: String,

        /// Maximum number of results
        #[clap(short, long)]
        limit: Option<usize>,
    },

    /// List products visible in the gallery
    Products,

    /// Embed a product image (ingestion-side helper)
    Analyze {
        /// URL of the image; the provider fetches it itself
        image_url: String,
    },

    /// Ping the embedding provider to wake it from sleep
    Warmup,
}
