use ambkit_cli::{handler, utils};
use clap::Parser;
use eyre::Result;
use profgen::{aws::AwsControlPlane, connection_profile, fetch_topology};
use std::path::PathBuf;

/// Generate a client connection profile for a managed ledger network.
#[derive(Clone, Debug, Parser)]
#[command(name = "profgen", version)]
pub struct ProfgenArgs {
    /// The network id (starts with n-...).
    #[arg(long = "network_id", value_name = "ID")]
    network_id: String,

    /// Channels to include in the profile.
    #[arg(long, num_args = 0.., value_name = "NAME")]
    channels: Vec<String>,

    /// Restrict the profile to a single member instead of listing all
    /// members of the network.
    #[arg(long = "member_id", value_name = "ID")]
    member_id: Option<String>,

    /// The location from which the TLS cert will be loaded by clients.
    #[arg(
        long = "tlsCaCertPath",
        default_value = "/tmp/managedblockchain-tls-chain.pem",
        value_name = "PATH"
    )]
    tls_ca_cert_path: PathBuf,
}

fn main() -> Result<()> {
    handler::install();
    utils::load_dotenv();
    utils::subscriber();
    let args = ProfgenArgs::parse();
    main_args(args)
}

#[tokio::main]
async fn main_args(args: ProfgenArgs) -> Result<()> {
    let api = AwsControlPlane::from_env().await;
    let (network, members) =
        fetch_topology(&api, &args.network_id, args.member_id.as_deref()).await?;
    let profile =
        connection_profile(&network, &members, &args.channels, &args.tls_ca_cert_path);
    println!("{}", serde_json::to_string_pretty(&profile)?);

    // A profile without channels cannot route any channel-scoped calls.
    if args.channels.is_empty() {
        eprintln!("WARNING: no channels were specified");
    }
    Ok(())
}
