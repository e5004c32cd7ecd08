pub mod apply;
pub mod compare;
pub mod delta;

pub use apply::{apply_delta, Mutator};
pub use compare::{diff, Compare, Difference, FieldDelta};
pub use delta::{
    compute_delta, compute_desired_delta, CollectionDelta, DuplicateKeys, Subresource, SyncPolicy,
    UpdateMode,
};
