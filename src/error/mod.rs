mod epigraph;

pub use epigraph::{ApiErrorBody, EpigraphError};

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
