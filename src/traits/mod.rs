pub mod executor;
pub mod request;

pub use executor::{Task, TaskExecutor};
pub use request::{
    BlobBinding, CompletionCallback, PartitionRequest, SubRequest, WaitMode, WaitStatus,
};
