//! Custom error types for plexy.
//!
//! Every fallible operation in the crate returns [`AppError`]; the binary
//! reports it and exits, nothing is retried.

use std::error::Error;
use std::fmt;
use std::io;

/// Application error types.
#[derive(Debug)]
pub enum AppError {
    /// Network/HTTP errors
    Network(String),
    /// The server rejected the token
    Auth(String),
    /// API response parsing errors
    Parse(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(io::Error),
    /// Library section or item not found
    NotFound(String),
    /// Invalid input from user
    InvalidInput(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            AppError::Parse(msg) => write!(f, "Parse error: {}", msg),
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status.as_u16() == 401 || status.as_u16() == 403 => {
                AppError::Auth(err.to_string())
            }
            _ if err.is_decode() => AppError::Parse(err.to_string()),
            _ => AppError::Network(err.to_string()),
        }
    }
}

// JSON only reaches us through config files; API bodies go through reqwest.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Answer a single HTTP request with a bare status line.
    fn serve_status(status: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                    status
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/", addr)
    }

    async fn status_error(status: &'static str) -> AppError {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let err = client
            .get(serve_status(status))
            .send()
            .await
            .unwrap()
            .error_for_status()
            .unwrap_err();
        err.into()
    }

    #[tokio::test]
    async fn test_error_from_reqwest_status() {
        assert!(matches!(status_error("401 Unauthorized").await, AppError::Auth(_)));
        assert!(matches!(status_error("403 Forbidden").await, AppError::Auth(_)));
        assert!(matches!(status_error("500 Internal Server Error").await, AppError::Network(_)));
    }

    #[test]
    fn test_error_from_json() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Config(_)));
    }

    #[test]
    fn test_error_display() {
        let err = AppError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.source().is_some());
    }

    #[test]
    fn test_error_not_found() {
        let err = AppError::NotFound("library 'Cartoons'".to_string());
        assert!(err.to_string().contains("Cartoons"));
    }

    #[test]
    fn test_error_from_toml() {
        let err = toml::from_str::<toml::Value>("url = ").unwrap_err();
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Config(_)));
    }
}
