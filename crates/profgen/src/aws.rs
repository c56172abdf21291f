//! Control-plane access via the Amazon Managed Blockchain API.

use crate::{ControlPlane, Member, Network, Node};
use async_trait::async_trait;
use aws_sdk_managedblockchain::Client;
use eyre::{eyre, Result};
use tracing::debug;

/// [`ControlPlane`] implementation over the Managed Blockchain SDK.
///
/// Listings are paginated with `NextToken` until exhausted; every
/// summary is followed by a detail fetch, sequentially.
pub struct AwsControlPlane {
    client: Client,
}

impl AwsControlPlane {
    /// Builds a client from the default AWS environment (region and
    /// credentials resolved the same way the AWS CLI resolves them).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self { client: Client::new(&config) }
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ControlPlane for AwsControlPlane {
    async fn describe_network(&self, network_id: &str) -> Result<Network> {
        debug!(%network_id, "fetching network description");
        let out = self.client.get_network().network_id(network_id).send().await?;
        let network = out.network.ok_or_else(|| missing("Network"))?;
        let fabric = network
            .framework_attributes
            .and_then(|attributes| attributes.fabric)
            .ok_or_else(|| missing("Network.FrameworkAttributes.Fabric"))?;
        Ok(Network {
            id: network.id.ok_or_else(|| missing("Network.Id"))?,
            name: network.name.ok_or_else(|| missing("Network.Name"))?,
            ordering_service_endpoint: fabric
                .ordering_service_endpoint
                .ok_or_else(|| missing("Network.FrameworkAttributes.Fabric.OrderingServiceEndpoint"))?,
        })
    }

    async fn list_members(&self, network_id: &str) -> Result<Vec<Member>> {
        let mut members = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = self.client.list_members().network_id(network_id);
            if let Some(token) = &next_token {
                request = request.next_token(token.as_str());
            }
            let page = request.send().await?;
            for summary in page.members.unwrap_or_default() {
                let id = summary.id.ok_or_else(|| missing("MemberSummary.Id"))?;
                members.push(self.describe_member(network_id, &id).await?);
            }
            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }
        debug!(%network_id, count = members.len(), "listed members");
        Ok(members)
    }

    async fn describe_member(&self, network_id: &str, member_id: &str) -> Result<Member> {
        let out =
            self.client.get_member().network_id(network_id).member_id(member_id).send().await?;
        let member = out.member.ok_or_else(|| missing("Member"))?;
        let fabric = member
            .framework_attributes
            .and_then(|attributes| attributes.fabric)
            .ok_or_else(|| missing("Member.FrameworkAttributes.Fabric"))?;
        Ok(Member {
            id: member.id.ok_or_else(|| missing("Member.Id"))?,
            name: member.name.ok_or_else(|| missing("Member.Name"))?,
            ca_endpoint: fabric
                .ca_endpoint
                .ok_or_else(|| missing("Member.FrameworkAttributes.Fabric.CaEndpoint"))?,
        })
    }

    async fn list_nodes(&self, network_id: &str, member_id: &str) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request =
                self.client.list_nodes().network_id(network_id).member_id(member_id);
            if let Some(token) = &next_token {
                request = request.next_token(token.as_str());
            }
            let page = request.send().await?;
            for summary in page.nodes.unwrap_or_default() {
                let id = summary.id.ok_or_else(|| missing("NodeSummary.Id"))?;
                nodes.push(self.describe_node(network_id, member_id, &id).await?);
            }
            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }
        debug!(%network_id, %member_id, count = nodes.len(), "listed nodes");
        Ok(nodes)
    }
}

impl AwsControlPlane {
    async fn describe_node(
        &self,
        network_id: &str,
        member_id: &str,
        node_id: &str,
    ) -> Result<Node> {
        let out = self
            .client
            .get_node()
            .network_id(network_id)
            .member_id(member_id)
            .node_id(node_id)
            .send()
            .await?;
        let node = out.node.ok_or_else(|| missing("Node"))?;
        let fabric = node
            .framework_attributes
            .and_then(|attributes| attributes.fabric)
            .ok_or_else(|| missing("Node.FrameworkAttributes.Fabric"))?;
        Ok(Node {
            id: node.id.ok_or_else(|| missing("Node.Id"))?,
            peer_endpoint: fabric
                .peer_endpoint
                .ok_or_else(|| missing("Node.FrameworkAttributes.Fabric.PeerEndpoint"))?,
            peer_event_endpoint: fabric
                .peer_event_endpoint
                .ok_or_else(|| missing("Node.FrameworkAttributes.Fabric.PeerEventEndpoint"))?,
        })
    }
}

fn missing(field: &str) -> eyre::Report {
    eyre!("control plane response is missing `{field}`")
}
