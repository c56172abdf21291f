//! Generation of private-data collection configs.
//!
//! A collection restricts a piece of channel data to a named set of
//! members. The generated set always contains a catalog collection and
//! an admin-only licenses collection, plus one account collection per
//! member; every access policy is a disjunction over member identities.

use serde::{Deserialize, Serialize};

/// The catalog collection used by chaincode versions predating the v2
/// catalog layout. Only generated as a migration stub.
pub const CATALOG_COLLECTION: &str = "catalog_coll";

/// The current catalog collection.
pub const CATALOG_COLLECTION_V2: &str = "catalog_coll_v2";

/// The admin-only licenses collection.
pub const LICENSES_COLLECTION: &str = "licenses_coll";

/// Name of the account collection for the given member.
pub fn account_collection(member: &str) -> String {
    format!("{member}_account_coll")
}

/// Produced when a policy would be generated over zero participants,
/// which would yield a collection nobody can access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid policy produced with no member access")]
pub struct EmptyPolicyError;

/// A single private-data collection descriptor, serialized with the
/// field names the peer expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    pub name: String,
    pub policy: String,
    pub required_peer_count: usize,
    pub max_peer_count: usize,
    pub blocks_to_live: u64,
    pub member_only_read: bool,
    pub member_only_write: bool,
}

/// Builds an `OR(...)` signature policy over the given member IDs.
///
/// Each member contributes a single `'<id>.member'` principal, in input
/// order: `OR('m-A.member', 'm-B.member')`.
pub fn or_signature_policy<I, S>(members: I) -> Result<String, EmptyPolicyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let principals = members
        .into_iter()
        .map(|member| format!("'{}.member'", member.as_ref()))
        .collect::<Vec<_>>();
    if principals.is_empty() {
        return Err(EmptyPolicyError);
    }
    Ok(format!("OR({})", principals.join(", ")))
}

/// Builds a single collection over the given participants.
///
/// Peer-count bounds are pure functions of the participant count: data
/// can be disseminated to every other participating peer, and
/// endorsement requires one other peer as soon as there is one.
pub fn collection<I, S>(
    name: &str,
    participants: I,
    blocks_to_live: u64,
    member_only_read: bool,
) -> Result<CollectionConfig, EmptyPolicyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let participants = participants.into_iter().collect::<Vec<_>>();
    let count = participants.len();
    Ok(CollectionConfig {
        name: name.to_string(),
        policy: or_signature_policy(participants)?,
        required_peer_count: usize::from(count > 1),
        max_peer_count: count.saturating_sub(1),
        blocks_to_live,
        member_only_read,
        member_only_write: true,
    })
}

/// Generates the ordered collection set for a network administered by
/// `admin` with the given approved and unapproved members.
///
/// Output order: optional legacy catalog stub (with `migrate`), the v2
/// catalog, the licenses collection, then one account collection per
/// member, approved before unapproved, each in input order.
pub fn collection_configs(
    admin: &str,
    approved: &[String],
    unapproved: &[String],
    blocks_to_live: u64,
    migrate: bool,
) -> Result<Vec<CollectionConfig>, EmptyPolicyError> {
    let mut configs = Vec::with_capacity(3 + approved.len() + unapproved.len());

    if migrate {
        // Stub readable only by the admin member, for chaincode versions
        // that still look up the old catalog layout.
        configs.push(collection(CATALOG_COLLECTION, [admin], blocks_to_live, true)?);
    }

    let catalog_members = std::iter::once(admin).chain(approved.iter().map(String::as_str));
    configs.push(collection(CATALOG_COLLECTION_V2, catalog_members, blocks_to_live, false)?);
    configs.push(collection(LICENSES_COLLECTION, [admin], blocks_to_live, true)?);

    for member in approved.iter().chain(unapproved) {
        configs.push(collection(
            &account_collection(member),
            [admin, member.as_str()],
            blocks_to_live,
            true,
        )?);
    }

    Ok(configs)
}
