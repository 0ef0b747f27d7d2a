use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the http server
    Daemon {
        /// Address to listen on (overrides config.yaml)
        #[clap(short, long)]
        listen: Option<String>,
    },

    /// Search entries with a boolean query
    ///
    /// Words are AND-ed implicitly; AND, OR, NOT and parentheses
    /// can be used to group. "quoted phrases" match verbatim.
    Search {
        /// e.g. `rust (video OR talk) NOT "old stuff"`
        #[clap(default_value = "")]
        query: String,

        /// Limit to a tag path such as `dev/rust`, or `Untagged`
        #[clap(short, long, default_value = "__ALL__")]
        path: String,

        /// Print only the number of matches
        #[clap(short, long, default_value = "false")]
        count: bool,
    },

    /// Print the tag tree with counts
    Tags {},

    /// Add an entry
    Add {
        /// http:// or https:// url
        url: String,

        /// Entry title, defaults to the url
        #[clap(short, long)]
        title: Option<String>,

        #[clap(short, long)]
        description: Option<String>,

        /// Comma separated, e.g. `dev/rust, reading`
        #[clap(long)]
        tags: Option<String>,
    },

    /// Delete an entry by id
    Delete {
        id: String,

        /// Auto confirm
        #[clap(short, long, default_value = "false")]
        yes: bool,
    },

    /// Replace every entry with the contents of an exported file
    Import {
        /// JSON file with an `entries` list
        file: String,
    },

    /// Print the whole store as JSON
    Export {},
}
