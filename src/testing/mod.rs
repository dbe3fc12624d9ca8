//! Test doubles for exercising the dispatcher without real processors

pub mod mocks;

pub use mocks::MockAgent;
