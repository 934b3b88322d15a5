pub mod context;
pub mod extraction;
pub mod message;
