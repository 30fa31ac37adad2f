#![allow(dead_code)]

mod mocks;

pub use mocks::MockFile;

/// Routes `log` output of the crate through the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
