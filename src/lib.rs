use thiserror::Error;

/// Error types for the httpecho library
#[derive(Error, Debug)]
pub enum EchoError {
    /// Socket-level errors (bind, accept, read, write)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request head could not be parsed as HTTP
    #[error("HTTP parsing error: {0}")]
    Parse(String),

    /// Request parsed but uses something the server does not support
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Connection closed before a full request arrived
    #[error("Incomplete request")]
    IncompleteRequest,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// UTF-8 encoding errors
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for the httpecho library
pub type Result<T> = std::result::Result<T, EchoError>;

pub mod client;
pub mod config;
pub mod handler;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

// Re-export main types for convenience
pub use client::{Client, ClientConfig, ClientResponse};
pub use config::ServerConfig;
pub use handler::{EchoHandler, Handler};
pub use request::Request;
pub use response::Response;
pub use router::Router;
pub use server::EchoServer;
