#![allow(dead_code)]

pub use mongovisor_test_utils::{builders, fake_backend, init_tracing, with_timeout};
