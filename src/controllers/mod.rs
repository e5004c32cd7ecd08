use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kube::runtime::controller::Action;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, instrument, warn, Span};

use crate::ec2::ApiError;
use crate::resources::Object;
use crate::{telemetry, Config, Error, Metrics, MetricsRecorder, OpType, Result};

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

/// Shared by every resource manager
pub struct Context<C> {
    /// EC2 client
    pub client: C,
    /// Receives one record per EC2 call
    pub metrics: Arc<dyn MetricsRecorder>,
    pub config: Config,
}

impl<C> Context<C> {
    pub fn new(client: C, metrics: Arc<dyn MetricsRecorder>, config: Config) -> Self {
        Self {
            client,
            metrics,
            config,
        }
    }

    /// Run one EC2 call under the cancellation token and the configured
    /// deadline, and record it.
    pub async fn call<T, F>(
        &self,
        cancel: &CancellationToken,
        op_type: OpType,
        operation: &'static str,
        call: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = with_deadline(self.config.api_call_timeout, operation, call) => result,
        };
        match &result {
            Ok(_) => debug!(%op_type, operation, "EC2 call succeeded"),
            Err(e) => debug!(%op_type, operation, error = %e, "EC2 call failed"),
        }
        self.metrics
            .record_api_call(op_type, operation, result.as_ref().err());
        result
    }
}

async fn with_deadline<T>(
    deadline: Option<Duration>,
    operation: &'static str,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T> {
    let result = match deadline {
        Some(after) => tokio::time::timeout(after, call)
            .await
            .map_err(|_| Error::DeadlineExceeded { operation, after })?,
        None => call.await,
    };
    result.map_err(Error::api(operation))
}

/// The representation a manager reads and returns
pub type Resource<M> = Object<<M as ResourceManager>::Spec, <M as ResourceManager>::Status>;

/// The four operations the reconciliation framework invokes for one kind.
///
/// `update` computes the delta between `desired` and `latest`, applies it,
/// and re-reads the resource. Every call observes `cancel`.
#[async_trait]
pub trait ResourceManager: Send + Sync {
    type Spec: Clone + Send + Sync;
    type Status: Clone + Send + Sync;

    const KIND: &'static str;

    /// Read the observed state. `Error::NotFound` when it does not exist.
    async fn find(
        &self,
        resource: &Resource<Self>,
        cancel: &CancellationToken,
    ) -> Result<Resource<Self>>;

    async fn create(
        &self,
        desired: &Resource<Self>,
        cancel: &CancellationToken,
    ) -> Result<Resource<Self>>;

    async fn update(
        &self,
        desired: &Resource<Self>,
        latest: &Resource<Self>,
        cancel: &CancellationToken,
    ) -> Result<Resource<Self>>;

    async fn delete(
        &self,
        latest: &Resource<Self>,
        cancel: &CancellationToken,
    ) -> Result<Resource<Self>>;
}

/// One reconciliation pass: delete when the resource is being deleted,
/// create when it does not exist yet, update otherwise.
#[instrument(skip_all, fields(kind = M::KIND, name, trace_id))]
pub async fn reconcile<M: ResourceManager>(
    manager: &M,
    metrics: &Metrics,
    desired: &Resource<M>,
    cancel: &CancellationToken,
) -> Result<Resource<M>> {
    if let Some(trace_id) = telemetry::get_trace_id() {
        Span::current().record("trace_id", field::display(&trace_id));
    }
    let name = desired.metadata.name.clone().unwrap_or_default();
    Span::current().record("name", field::display(&name));

    let observed = manager.find(desired, cancel).await;
    let result = if desired.metadata.deletion_timestamp.is_some() {
        let _timer = metrics.count_and_measure(M::KIND, "delete");
        match observed {
            Ok(latest) => {
                info!("Deleting {} \"{name}\"", M::KIND);
                manager.delete(&latest, cancel).await
            }
            Err(Error::NotFound) => Ok(desired.clone()),
            Err(e) => Err(e),
        }
    } else {
        match observed {
            Err(Error::NotFound) => {
                let _timer = metrics.count_and_measure(M::KIND, "create");
                info!("Creating {} \"{name}\"", M::KIND);
                manager.create(desired, cancel).await
            }
            Ok(latest) => {
                let _timer = metrics.count_and_measure(M::KIND, "update");
                debug!("Updating {} \"{name}\"", M::KIND);
                manager.update(desired, &latest, cancel).await
            }
            Err(e) => Err(e),
        }
    };

    if let Err(e) = &result {
        match e {
            Error::Requeue { message, .. } => {
                info!("{} \"{name}\" is not ready: {message}", M::KIND)
            }
            e => warn!("reconcile failed: {:?}", e),
        }
        metrics.reconcile_failure(M::KIND, e);
    }
    result
}

/// When the framework should run the next pass after `error`.
pub fn error_policy(error: &Error, config: &Config) -> Action {
    match error.requeue_after(config) {
        Some(after) => Action::requeue(after),
        None => Action::await_change(),
    }
}

/// The identifier EC2 assigned, from the resource status.
pub(crate) fn required<'a>(id: Option<&'a String>, name: &'static str) -> Result<&'a str> {
    id.map(String::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(Error::MissingIdentifier(name))
}

/// Map EC2 `*.NotFound` codes to `Error::NotFound`.
pub(crate) fn not_found(error: Error) -> Error {
    match error {
        Error::Api { source, .. } if source.is_not_found() => Error::NotFound,
        e => e,
    }
}

/// The single described item, or `NotFound`.
pub(crate) fn single<T>(mut items: Vec<T>) -> Result<T> {
    match items.len() {
        1 => Ok(items.remove(0)),
        _ => Err(Error::NotFound),
    }
}
