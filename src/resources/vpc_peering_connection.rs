use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Object, Tag};
use crate::reconcilers::{Compare, FieldDelta};

pub type VpcPeeringConnection = Object<VpcPeeringConnectionSpec, VpcPeeringConnectionStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VpcPeeringConnectionSpec {
    #[serde(rename = "vpcID")]
    pub vpc_id: Option<String>,
    #[serde(rename = "peerVPCID")]
    pub peer_vpc_id: Option<String>,
    #[serde(rename = "peerOwnerID")]
    pub peer_owner_id: Option<String>,
    pub peer_region: Option<String>,
    /// Accept the request when both VPCs are owned by this account.
    pub accept_request: Option<bool>,
    pub accepter_peering_connection_options: Option<PeeringConnectionOptions>,
    pub requester_peering_connection_options: Option<PeeringConnectionOptions>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Compare for VpcPeeringConnectionSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(prefix, "vpcID", &self.vpc_id, &other.vpc_id);
        delta.compare_field(prefix, "peerVPCID", &self.peer_vpc_id, &other.peer_vpc_id);
        // EC2 fills in the owner and region when they are left to default
        delta.compare_desired(prefix, "peerOwnerID", &self.peer_owner_id, &other.peer_owner_id);
        delta.compare_desired(prefix, "peerRegion", &self.peer_region, &other.peer_region);
        delta.compare_desired(prefix, "acceptRequest", &self.accept_request, &other.accept_request);
        delta.compare_desired_nested(
            prefix,
            "accepterPeeringConnectionOptions",
            &self.accepter_peering_connection_options,
            &other.accepter_peering_connection_options,
        );
        delta.compare_desired_nested(
            prefix,
            "requesterPeeringConnectionOptions",
            &self.requester_peering_connection_options,
            &other.requester_peering_connection_options,
        );
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeeringConnectionOptions {
    #[serde(rename = "allowDNSResolutionFromRemoteVPC")]
    pub allow_dns_resolution_from_remote_vpc: Option<bool>,
}

impl Compare for PeeringConnectionOptions {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_desired(
            prefix,
            "allowDNSResolutionFromRemoteVPC",
            &self.allow_dns_resolution_from_remote_vpc,
            &other.allow_dns_resolution_from_remote_vpc,
        );
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VpcPeeringConnectionStatus {
    #[serde(rename = "vpcPeeringConnectionID")]
    pub id: Option<String>,
    pub status: Option<PeeringStatus>,
    pub expiration_time: Option<String>,
    /// Set once this controller has accepted the request.
    pub accepted: Option<bool>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeeringStatus {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Lifecycle of a peering connection as reported in `status.code`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeeringState {
    InitiatingRequest,
    PendingAcceptance,
    Provisioning,
    Active,
    Deleting,
    Deleted,
    Rejected,
    Failed,
    Expired,
    Unknown,
}

impl PeeringState {
    pub fn parse(code: &str) -> Self {
        match code {
            "initiating-request" => Self::InitiatingRequest,
            "pending-acceptance" => Self::PendingAcceptance,
            "provisioning" => Self::Provisioning,
            "active" => Self::Active,
            "deleting" => Self::Deleting,
            "deleted" => Self::Deleted,
            "rejected" => Self::Rejected,
            "failed" => Self::Failed,
            "expired" => Self::Expired,
            _ => Self::Unknown,
        }
    }

    /// States in which EC2 rejects every modification.
    pub fn is_transitional(self) -> bool {
        matches!(
            self,
            Self::InitiatingRequest | Self::Provisioning | Self::Deleting
        )
    }

    /// States from which the connection can never become active again.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            Self::Deleted | Self::Rejected | Self::Failed | Self::Expired
        )
    }
}

impl VpcPeeringConnectionStatus {
    pub fn state(&self) -> PeeringState {
        self.status
            .as_ref()
            .and_then(|s| s.code.as_deref())
            .map_or(PeeringState::Unknown, PeeringState::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parsing() {
        let status = |code: &str| VpcPeeringConnectionStatus {
            status: Some(PeeringStatus {
                code: Some(code.into()),
                message: None,
            }),
            ..Default::default()
        };
        assert_eq!(status("pending-acceptance").state(), PeeringState::PendingAcceptance);
        assert!(status("provisioning").state().is_transitional());
        assert!(status("initiating-request").state().is_transitional());
        assert!(!status("active").state().is_transitional());
        assert!(status("expired").state().is_final());
        assert_eq!(VpcPeeringConnectionStatus::default().state(), PeeringState::Unknown);
    }
}
