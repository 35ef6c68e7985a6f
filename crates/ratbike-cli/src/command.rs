//! Command-line interface for the `ratbike` binary.

use clap::{Args, Parser, Subcommand};
use ratbike_core::{BikePart, BikesFilter, Parts};

/// RatBike - keep track of bikes and bike parts
#[derive(Parser, Debug)]
#[command(name = "ratbike")]
#[command(about = "Keep track of bikes and bike parts")]
#[command(version)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List bikes, optionally filtered
    List {
        /// all, active or completed
        #[arg(default_value = "all", value_parser = parse_filter)]
        filter: BikesFilter,
    },
    /// Show one bike
    Show {
        /// Bike id or unique id prefix
        id: String,
    },
    /// Add a bike
    Add {
        #[command(flatten)]
        fields: BikeFields,

        /// Mark the bike complete
        #[arg(long)]
        complete: bool,
    },
    /// Change a bike's type, address, parts or status
    Edit {
        /// Bike id or unique id prefix
        id: String,

        #[command(flatten)]
        fields: BikeFields,

        /// Mark the bike complete
        #[arg(long, conflicts_with = "active")]
        complete: bool,

        /// Mark the bike incomplete
        #[arg(long)]
        active: bool,
    },
    /// Mark a bike complete
    Complete {
        /// Bike id or unique id prefix
        id: String,
    },
    /// Mark a bike incomplete
    Activate {
        /// Bike id or unique id prefix
        id: String,
    },
    /// Delete a bike
    Delete {
        /// Bike id or unique id prefix
        id: String,
    },
    /// Delete every complete bike
    ClearCompleted,
    /// Delete every bike
    DeleteAll,
    /// Reload from the remote and list
    Refresh {
        /// all, active or completed
        #[arg(default_value = "all", value_parser = parse_filter)]
        filter: BikesFilter,
    },
    /// Show part numbers for --parts
    Parts,
}

/// Bike fields shared by `add` and `edit`.
#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct BikeFields {
    /// Kind of bike, e.g. Mountain (empty clears it when editing)
    #[arg(long = "type", value_name = "TYPE")]
    pub bike_type: Option<String>,

    /// Where the bike is (empty clears it when editing)
    #[arg(long)]
    pub address: Option<String>,

    /// Comma-separated numbers of the parts present, e.g. 0,2,5
    #[arg(long, value_name = "NUMBERS", value_parser = parse_parts)]
    pub parts: Option<Parts>,
}

fn parse_filter(s: &str) -> Result<BikesFilter, String> {
    s.parse()
}

/// Parse a comma-separated list of part numbers into a checklist.
fn parse_parts(raw: &str) -> Result<Parts, String> {
    let mut parts: Parts = [false; BikePart::COUNT];
    for piece in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let index: usize = piece
            .parse()
            .map_err(|_| format!("'{}' is not a part number", piece))?;
        let part = BikePart::from_index(index).ok_or_else(|| {
            format!("Part number {} out of range (0-{})", index, BikePart::COUNT - 1)
        })?;
        parts[part.index()] = true;
    }
    Ok(parts)
}
