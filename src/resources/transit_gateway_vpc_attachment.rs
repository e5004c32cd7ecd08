use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Object, Tag};
use crate::reconcilers::{Compare, FieldDelta};

pub const STATE_AVAILABLE: &str = "available";

pub type TransitGatewayVpcAttachment =
    Object<TransitGatewayVpcAttachmentSpec, TransitGatewayVpcAttachmentStatus>;

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitGatewayVpcAttachmentSpec {
    #[serde(rename = "transitGatewayID")]
    pub transit_gateway_id: Option<String>,
    #[serde(rename = "vpcID")]
    pub vpc_id: Option<String>,
    #[serde(default, rename = "subnetIDs")]
    pub subnet_ids: Vec<String>,
    pub options: Option<AttachmentOptions>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Compare for TransitGatewayVpcAttachmentSpec {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_field(
            prefix,
            "transitGatewayID",
            &self.transit_gateway_id,
            &other.transit_gateway_id,
        );
        delta.compare_field(prefix, "vpcID", &self.vpc_id, &other.vpc_id);
        delta.compare_set(prefix, "subnetIDs", &self.subnet_ids, &other.subnet_ids);
        delta.compare_desired_nested(prefix, "options", &self.options, &other.options);
        delta.compare_subresources(prefix, "tags", &self.tags, &other.tags);
    }
}

/// Each option is `enable` or `disable`.
#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentOptions {
    pub appliance_mode_support: Option<String>,
    pub dns_support: Option<String>,
    pub ipv6_support: Option<String>,
}

impl Compare for AttachmentOptions {
    fn compare(&self, other: &Self, prefix: &str, delta: &mut FieldDelta) {
        delta.compare_desired(
            prefix,
            "applianceModeSupport",
            &self.appliance_mode_support,
            &other.appliance_mode_support,
        );
        delta.compare_desired(prefix, "dnsSupport", &self.dns_support, &other.dns_support);
        delta.compare_desired(prefix, "ipv6Support", &self.ipv6_support, &other.ipv6_support);
    }
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitGatewayVpcAttachmentStatus {
    pub id: Option<String>,
    pub state: Option<String>,
    pub vpc_owner_id: Option<String>,
}
