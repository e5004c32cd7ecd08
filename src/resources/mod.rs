use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
pub use kube::core::Object;

pub mod dhcp_options;
pub mod internet_gateway;
pub mod managed_prefix_list;
pub mod network_acl;
pub mod route_table;
pub mod security_group;
pub mod subnet;
pub mod tags;
pub mod transit_gateway_vpc_attachment;
pub mod vpc;
pub mod vpc_endpoint;
pub mod vpc_endpoint_service_configuration;
pub mod vpc_peering_connection;

pub use tags::Tag;

/// Build a resource representation from its parts.
pub fn object<P: Clone, U: Clone>(
    metadata: ObjectMeta,
    spec: P,
    status: Option<U>,
) -> Object<P, U> {
    Object {
        types: None,
        metadata,
        spec,
        status,
    }
}
