pub mod batch;
pub mod compositing;
pub mod error;
pub mod illustration;
pub mod scenes;
pub mod story;
pub mod studio;
pub mod types;
pub mod upstream;
pub mod workflow;

#[cfg(any(test, feature = "test-support"))]
pub mod fakes;
