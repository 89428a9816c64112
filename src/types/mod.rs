pub mod api;

pub use api::{InjectFailureResponse, InjectRequest, InjectResponse};
