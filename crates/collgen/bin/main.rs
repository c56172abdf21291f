use ambkit_cli::{handler, utils};
use clap::Parser;
use collgen::collection_configs;
use eyre::Result;

/// Generate a private-data collection config for a Fabric network.
#[derive(Clone, Debug, Parser)]
#[command(name = "collgen", version)]
pub struct CollgenArgs {
    /// The administrator member's ID (usually starts with m-...).
    #[arg(long, value_name = "ID")]
    admin: String,

    /// IDs of members who have an account (usually start with m-...).
    #[arg(long, num_args = 0.., value_name = "ID")]
    approved: Vec<String>,

    /// IDs of members who do not have an account yet.
    #[arg(long, num_args = 0.., value_name = "ID")]
    unapproved: Vec<String>,

    /// How many blocks data should live in a collection (0 for forever).
    #[arg(long = "blocksToLive", default_value_t = 0, value_name = "BLOCKS")]
    blocks_to_live: u64,

    /// Also emit the legacy catalog stub, for migrating from a chaincode
    /// version that used the older catalog layout.
    #[arg(long)]
    migrate: bool,
}

fn main() -> Result<()> {
    handler::install();
    utils::load_dotenv();
    utils::subscriber();
    let args = CollgenArgs::parse();

    let configs = collection_configs(
        &args.admin,
        &args.approved,
        &args.unapproved,
        args.blocks_to_live,
        args.migrate,
    )?;
    println!("{}", serde_json::to_string_pretty(&configs)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_member_lists() {
        let args = CollgenArgs::parse_from([
            "collgen",
            "--admin",
            "m-A",
            "--approved",
            "m-B",
            "m-C",
            "--unapproved",
            "--blocksToLive",
            "1000000",
        ]);
        assert_eq!(args.admin, "m-A");
        assert_eq!(args.approved, ["m-B", "m-C"]);
        assert!(args.unapproved.is_empty());
        assert_eq!(args.blocks_to_live, 1_000_000);
        assert!(!args.migrate);
    }
}
