//! Assembly of Fabric client connection profiles.
//!
//! The profile is a deterministic function of the network topology at
//! fetch time: the network's ordering service, every member's peers and
//! certificate authority, and the channels the caller asks to route.
//! Fetching and assembly are separated behind [`ControlPlane`] so the
//! document shape can be tested without a live control plane.

use async_trait::async_trait;
use eyre::Result;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub mod aws;

/// A ledger network as described by the control plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub name: String,
    /// Endpoint of the network's single ordering service, `host:port`.
    pub ordering_service_endpoint: String,
}

/// A member organization of the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub name: String,
    /// URL of the member's certificate authority.
    pub ca_endpoint: String,
}

/// A peer node owned by a member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    /// Peer gRPC endpoint, `host:port`.
    pub peer_endpoint: String,
    /// Peer event-service endpoint, `host:port`.
    pub peer_event_endpoint: String,
}

/// Read access to the managed-ledger control plane.
///
/// Implementations fetch sequentially and propagate any API failure;
/// there is no retry and no snapshot isolation, so a topology change
/// between calls is observable in the assembled profile.
#[async_trait]
pub trait ControlPlane {
    async fn describe_network(&self, network_id: &str) -> Result<Network>;

    /// Lists every member and fetches its detail record.
    async fn list_members(&self, network_id: &str) -> Result<Vec<Member>>;

    /// Fetches a single member's detail record.
    async fn describe_member(&self, network_id: &str, member_id: &str) -> Result<Member>;

    /// Lists a member's nodes and fetches each detail record.
    async fn list_nodes(&self, network_id: &str, member_id: &str) -> Result<Vec<Node>>;
}

/// The fetched topology: the network plus each member with its nodes,
/// in control-plane listing order.
pub type Topology = (Network, Vec<(Member, Vec<Node>)>);

/// Fetches the network, its members and their nodes.
///
/// With `member_id` set, the member listing is skipped and the profile
/// is restricted to that single member.
pub async fn fetch_topology(
    api: &(impl ControlPlane + Sync),
    network_id: &str,
    member_id: Option<&str>,
) -> Result<Topology> {
    let network = api.describe_network(network_id).await?;
    let members = match member_id {
        Some(id) => vec![api.describe_member(network_id, id).await?],
        None => api.list_members(network_id).await?,
    };
    let mut topology = Vec::with_capacity(members.len());
    for member in members {
        let nodes = api.list_nodes(network_id, &member.id).await?;
        topology.push((member, nodes));
    }
    Ok((network, topology))
}

/// Strips the port (and anything after the first `:`) off an endpoint,
/// leaving the hostname used for TLS target-name overrides.
pub fn endpoint_host(endpoint: &str) -> &str {
    endpoint.split(':').next().unwrap_or(endpoint)
}

/// Name of the orderer entry for the given network.
pub fn orderer_key(network_name: &str) -> String {
    format!("orderer-{network_name}")
}

/// Name of the certificate-authority entry for the given member.
pub fn ca_key(member_name: &str) -> String {
    format!("ca-{member_name}")
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPeerFlags {
    pub chaincode_query: bool,
    pub ledger_query: bool,
    pub endorsing_peer: bool,
    pub event_source: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Channel {
    pub orderers: Vec<String>,
    pub peers: BTreeMap<String, ChannelPeerFlags>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcsOptions {
    #[serde(rename = "ssl-target-name-override")]
    pub ssl_target_name_override: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TlsCaCerts {
    pub path: PathBuf,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Orderer {
    pub url: String,
    pub grpcs_options: GrpcsOptions,
    #[serde(rename = "tlsCACerts")]
    pub tls_ca_certs: TlsCaCerts,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub mspid: String,
    pub peers: Vec<String>,
    pub certificate_authorities: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub url: String,
    pub event_url: String,
    pub grpcs_options: GrpcsOptions,
    #[serde(rename = "tlsCACerts")]
    pub tls_ca_certs: TlsCaCerts,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpOptions {
    pub verify: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateAuthority {
    pub url: String,
    pub http_options: HttpOptions,
    #[serde(rename = "tlsCACerts")]
    pub tls_ca_certs: TlsCaCerts,
    pub ca_name: String,
}

/// A client connection profile, serialized with the field names Fabric
/// client SDKs expect.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    pub name: String,
    #[serde(rename = "x-type")]
    pub x_type: String,
    pub description: String,
    pub version: String,
    pub channels: BTreeMap<String, Channel>,
    pub orderers: BTreeMap<String, Orderer>,
    pub organizations: BTreeMap<String, Organization>,
    pub peers: BTreeMap<String, Peer>,
    pub certificate_authorities: BTreeMap<String, CertificateAuthority>,
}

/// Assembles the connection profile for the fetched topology.
///
/// Every channel references the network's single orderer and every peer
/// of every member; organizations reference their own peers by id and
/// their `ca-<name>` certificate authority.
pub fn connection_profile(
    network: &Network,
    members: &[(Member, Vec<Node>)],
    channels: &[String],
    tls_ca_cert_path: &Path,
) -> ConnectionProfile {
    let orderer = orderer_key(&network.name);
    let all_nodes = || members.iter().flat_map(|(_, nodes)| nodes);

    let channels = channels
        .iter()
        .map(|channel| {
            (
                channel.clone(),
                Channel {
                    orderers: vec![orderer.clone()],
                    peers: all_nodes()
                        .map(|node| {
                            (
                                node.id.clone(),
                                ChannelPeerFlags {
                                    chaincode_query: true,
                                    ledger_query: true,
                                    endorsing_peer: true,
                                    event_source: true,
                                },
                            )
                        })
                        .collect(),
                },
            )
        })
        .collect();

    let orderers = BTreeMap::from([(
        orderer,
        Orderer {
            url: format!("grpcs://{}", network.ordering_service_endpoint),
            grpcs_options: GrpcsOptions {
                ssl_target_name_override: endpoint_host(&network.ordering_service_endpoint)
                    .to_string(),
            },
            tls_ca_certs: TlsCaCerts { path: tls_ca_cert_path.to_path_buf() },
        },
    )]);

    let organizations = members
        .iter()
        .map(|(member, nodes)| {
            (
                member.name.clone(),
                Organization {
                    mspid: member.id.clone(),
                    peers: nodes.iter().map(|node| node.id.clone()).collect(),
                    certificate_authorities: vec![ca_key(&member.name)],
                },
            )
        })
        .collect();

    let peers = all_nodes()
        .map(|node| {
            (
                node.id.clone(),
                Peer {
                    url: format!("grpcs://{}", node.peer_endpoint),
                    event_url: format!("grpcs://{}", node.peer_event_endpoint),
                    grpcs_options: GrpcsOptions {
                        ssl_target_name_override: endpoint_host(&node.peer_endpoint).to_string(),
                    },
                    tls_ca_certs: TlsCaCerts { path: tls_ca_cert_path.to_path_buf() },
                },
            )
        })
        .collect();

    let certificate_authorities = members
        .iter()
        .map(|(member, _)| {
            (
                ca_key(&member.name),
                CertificateAuthority {
                    url: member.ca_endpoint.clone(),
                    http_options: HttpOptions { verify: false },
                    tls_ca_certs: TlsCaCerts { path: tls_ca_cert_path.to_path_buf() },
                    ca_name: member.id.clone(),
                },
            )
        })
        .collect();

    ConnectionProfile {
        name: network.name.clone(),
        x_type: "hlfv1".to_string(),
        description: "Generated connection profile".to_string(),
        version: "1.0".to_string(),
        channels,
        orderers,
        organizations,
        peers,
        certificate_authorities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticControlPlane {
        network: Network,
        members: Vec<Member>,
        nodes: BTreeMap<String, Vec<Node>>,
    }

    impl StaticControlPlane {
        fn two_members() -> Self {
            Self {
                network: Network {
                    id: "n-1".into(),
                    name: "testnet".into(),
                    ordering_service_endpoint: "orderer.example.com:30001".into(),
                },
                members: vec![
                    Member {
                        id: "m-A".into(),
                        name: "alpha".into(),
                        ca_endpoint: "https://ca.alpha.example.com:30002".into(),
                    },
                    Member {
                        id: "m-B".into(),
                        name: "beta".into(),
                        ca_endpoint: "https://ca.beta.example.com:30002".into(),
                    },
                ],
                nodes: BTreeMap::from([
                    (
                        "m-A".to_string(),
                        vec![Node {
                            id: "nd-1".into(),
                            peer_endpoint: "nd-1.example.com:30003".into(),
                            peer_event_endpoint: "nd-1.example.com:30004".into(),
                        }],
                    ),
                    (
                        "m-B".to_string(),
                        vec![
                            Node {
                                id: "nd-2".into(),
                                peer_endpoint: "nd-2.example.com:30003".into(),
                                peer_event_endpoint: "nd-2.example.com:30004".into(),
                            },
                            Node {
                                id: "nd-3".into(),
                                peer_endpoint: "nd-3.example.com:30003".into(),
                                peer_event_endpoint: "nd-3.example.com:30004".into(),
                            },
                        ],
                    ),
                ]),
            }
        }
    }

    #[async_trait]
    impl ControlPlane for StaticControlPlane {
        async fn describe_network(&self, _network_id: &str) -> Result<Network> {
            Ok(self.network.clone())
        }

        async fn list_members(&self, _network_id: &str) -> Result<Vec<Member>> {
            Ok(self.members.clone())
        }

        async fn describe_member(&self, _network_id: &str, member_id: &str) -> Result<Member> {
            self.members
                .iter()
                .find(|member| member.id == member_id)
                .cloned()
                .ok_or_else(|| eyre::eyre!("no such member: {member_id}"))
        }

        async fn list_nodes(&self, _network_id: &str, member_id: &str) -> Result<Vec<Node>> {
            Ok(self.nodes.get(member_id).cloned().unwrap_or_default())
        }
    }

    fn profile(channels: &[&str]) -> ConnectionProfile {
        let api = StaticControlPlane::two_members();
        let (network, members) = block_on(fetch_topology(&api, "n-1", None)).unwrap();
        let channels: Vec<String> = channels.iter().map(ToString::to_string).collect();
        connection_profile(&network, &members, &channels, Path::new("/tmp/tls-chain.pem"))
    }

    // A current-thread runtime is all these linear fetches need.
    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(fut)
    }

    #[test]
    fn strips_port_from_endpoints() {
        assert_eq!(endpoint_host("orderer.example.com:30001"), "orderer.example.com");
        assert_eq!(endpoint_host("no-port.example.com"), "no-port.example.com");
    }

    #[test]
    fn organizations_reference_known_peers() {
        let profile = profile(&["main"]);
        for organization in profile.organizations.values() {
            for peer in &organization.peers {
                assert!(profile.peers.contains_key(peer), "unknown peer id {peer}");
            }
        }
        assert_eq!(profile.organizations["alpha"].peers, ["nd-1"]);
        assert_eq!(profile.organizations["beta"].peers, ["nd-2", "nd-3"]);
    }

    #[test]
    fn channels_reference_the_single_orderer() {
        let profile = profile(&["main", "audit"]);
        assert_eq!(profile.channels.len(), 2);
        for channel in profile.channels.values() {
            assert_eq!(channel.orderers, ["orderer-testnet"]);
            assert_eq!(channel.peers.len(), 3);
        }
        assert!(profile.orderers.contains_key("orderer-testnet"));
    }

    #[test]
    fn peer_overrides_strip_the_port() {
        let profile = profile(&[]);
        let peer = &profile.peers["nd-2"];
        assert_eq!(peer.url, "grpcs://nd-2.example.com:30003");
        assert_eq!(peer.event_url, "grpcs://nd-2.example.com:30004");
        assert_eq!(peer.grpcs_options.ssl_target_name_override, "nd-2.example.com");
    }

    #[test]
    fn certificate_authorities_are_keyed_by_member_name() {
        let profile = profile(&[]);
        let ca = &profile.certificate_authorities["ca-alpha"];
        assert_eq!(ca.ca_name, "m-A");
        assert!(!ca.http_options.verify);
        assert_eq!(
            profile.organizations["alpha"].certificate_authorities,
            ["ca-alpha"]
        );
    }

    #[test]
    fn member_restriction_skips_the_listing() {
        let api = StaticControlPlane::two_members();
        let (_, members) = block_on(fetch_topology(&api, "n-1", Some("m-B"))).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].0.id, "m-B");
        assert_eq!(members[0].1.len(), 2);
    }

    #[test]
    fn serializes_with_fabric_field_names() {
        let value = serde_json::to_value(profile(&["main"])).unwrap();
        assert_eq!(value["x-type"], "hlfv1");
        assert_eq!(value["version"], "1.0");
        let peer = &value["peers"]["nd-1"];
        assert!(peer["grpcsOptions"]["ssl-target-name-override"].is_string());
        assert!(peer["tlsCACerts"]["path"].is_string());
        assert_eq!(value["channels"]["main"]["peers"]["nd-1"]["chaincodeQuery"], true);
        assert!(value["certificateAuthorities"]["ca-alpha"]["httpOptions"]["verify"].is_boolean());
        assert_eq!(value["organizations"]["alpha"]["mspid"], "m-A");
    }
}
