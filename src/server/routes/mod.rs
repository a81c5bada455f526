#[cfg(feature = "diagnostics")]
pub mod diagnostics;
pub mod quotes;
