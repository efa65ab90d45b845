pub mod protocol;
#[cfg(feature = "test-support")]
pub mod test_support;

pub use protocol::*;
