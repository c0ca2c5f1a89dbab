#![allow(dead_code, unused_imports)]

pub use sdkrun_test_utils::fake_executor::FakeExecutor;
pub use sdkrun_test_utils::recording::{Recorded, RecordingListener};
pub use sdkrun_test_utils::{init_tracing, sh, with_timeout};
