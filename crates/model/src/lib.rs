pub mod auth;
pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpModelAdapter;
pub use mock::MockModelAdapter;
pub use traits::{ModelAdapter, StructuredRequest, TextRequest};
