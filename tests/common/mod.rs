#![allow(unused_imports)]

pub use devloop_test_utils::builders;
pub use devloop_test_utils::fake_backend;
pub use devloop_test_utils::{init_tracing, with_timeout};
