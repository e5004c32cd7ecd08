//! Narrow seams over the EC2 API.
//!
//! Each trait covers the calls one resource kind needs. Requests are explicit
//! structs mapped from the resource representations; failures carry the EC2
//! error code so callers can classify them.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

mod dhcp_options;
mod internet_gateway;
mod managed_prefix_list;
mod network_acl;
mod route_table;
mod security_group;
mod subnet;
mod tags;
mod transit_gateway;
mod vpc;
mod vpc_endpoint;
mod vpc_endpoint_service;
mod vpc_peering;

#[cfg(test)]
pub(crate) mod fake;

pub use dhcp_options::*;
pub use internet_gateway::*;
pub use managed_prefix_list::*;
pub use network_acl::*;
pub use route_table::*;
pub use security_group::*;
pub use subnet::*;
pub use tags::*;
pub use transit_gateway::*;
pub use vpc::*;
pub use vpc_endpoint::*;
pub use vpc_endpoint_service::*;
pub use vpc_peering::*;

/// A failed EC2 call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    Throttling,
    NotFound,
    /// The request itself is invalid; retrying cannot succeed.
    Terminal,
    Transient,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Classify by error code. Codes not known to be permanent are retried.
    pub fn kind(&self) -> ApiErrorKind {
        static THROTTLING: OnceLock<Regex> = OnceLock::new();
        static TERMINAL: OnceLock<Regex> = OnceLock::new();

        let throttling = THROTTLING.get_or_init(|| {
            Regex::new(r"^(Throttling|ThrottlingException|RequestLimitExceeded|RequestThrottled)$")
                .unwrap()
        });
        let terminal = TERMINAL.get_or_init(|| {
            Regex::new(concat!(
                r"^(.+\.Malformed|InvalidParameter|InvalidParameterValue|",
                r"InvalidParameterCombination|MissingParameter|UnknownParameter|",
                r"UnsupportedOperation)$",
            ))
            .unwrap()
        });

        if throttling.is_match(&self.code) {
            ApiErrorKind::Throttling
        } else if self.code.ends_with(".NotFound") {
            ApiErrorKind::NotFound
        } else if terminal.is_match(&self.code) {
            ApiErrorKind::Terminal
        } else {
            ApiErrorKind::Transient
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ApiErrorKind::NotFound
    }
}

/// A Describe* filter, e.g. `vpc-id` = [`vpc-1`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }
}
