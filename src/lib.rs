pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod github;
pub mod pagination;
pub mod request;
pub mod response;
pub mod timing;

// Re-export commonly used types
pub use auth::Auth;
pub use cli::{Cli, Command, RequestArgs};
pub use config::{Config, ConfigSource};
pub use error::{ApiError, ConfigError, ItemError};
pub use github::{ApiResponse, GitHub, Paginate, ResponseBody};
pub use request::{ApiRequest, RequestItem};
pub use response::{JsonStyle, OutputFilter};
