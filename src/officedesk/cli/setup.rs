use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "officedesk", bin_name = "officedesk", version)]
#[command(about = "Back-office console for people, clients, projects and deals", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (request logging)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store the bearer token used for every request
    Login {
        token: String,
    },

    /// Forget the stored token
    Logout,

    /// List the entities the console manages
    Entities,

    /// List records, optionally filtered
    #[command(alias = "ls")]
    List {
        entity: String,

        /// Case-insensitive text search
        #[arg(short, long)]
        search: Option<String>,

        /// Exact match on a criterion, e.g. --where department=Ventas
        #[arg(short = 'w', long = "where", value_parser = parse_criterion)]
        criteria: Vec<(String, String)>,

        /// Earliest date (inclusive), YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,

        /// Latest date (inclusive), YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,

        /// Ask the server for records in these groups (entities with a filtered endpoint)
        #[arg(long = "in", value_delimiter = ',')]
        server_filter: Vec<String>,

        /// Print records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a workflow entity as a board
    Board {
        entity: String,
    },

    /// Create a record from field=value pairs (field:=json for raw JSON)
    Create {
        entity: String,

        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, Value)>,
    },

    /// Update a record from field=value pairs (field:=json for raw JSON)
    Update {
        entity: String,

        id: String,

        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, Value)>,
    },

    /// Move a board card to another column
    Move {
        entity: String,

        id: String,

        column: String,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        entity: String,

        id: String,
    },

    /// Get or set configuration values
    Config {
        key: Option<String>,

        value: Option<String>,
    },
}

/// `field=value` keeps the value as a string; `field:=value` parses it as JSON.
pub fn parse_field(raw: &str) -> Result<(String, Value), String> {
    if let Some((field, json)) = raw.split_once(":=") {
        let value = serde_json::from_str(json)
            .map_err(|e| format!("invalid JSON for '{}': {}", field, e))?;
        return Ok((non_empty(field)?, value));
    }
    match raw.split_once('=') {
        Some((field, value)) => Ok((non_empty(field)?, Value::String(value.to_string()))),
        None => Err(format!("expected field=value, got '{}'", raw)),
    }
}

pub fn parse_criterion(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) => Ok((non_empty(name)?, value.to_string())),
        None => Err(format!("expected criterion=value, got '{}'", raw)),
    }
}

fn non_empty(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        Err("field name must not be empty".to_string())
    } else {
        Ok(name.to_string())
    }
}
