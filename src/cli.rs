use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Women's fashion search engine", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the catalog.
    /// Prompts for queries until an empty line when no query is given.
    Search {
        /// Free-text query, e.g. "red cotton dress"
        query: Option<String>,

        /// Print results as json
        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// Load the catalog, computing and saving
    /// embeddings if the file has none yet.
    Load {},

    /// Serve the search api over http.
    Daemon {
        /// Address to listen on
        #[clap(short, long, default_value = "0.0.0.0:8080")]
        listen: String,
    },
}
