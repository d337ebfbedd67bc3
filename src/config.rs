//! Runtime configuration resolved from the process environment.

use std::env;

use crate::{AppError, Result};

/// Environment variable holding the HTTP listen port.
pub const PORT_ENV: &str = "PORT";

fn default_http_port() -> u16 {
    3000
}

/// Global configuration for the server process.
///
/// The only externally visible setting is the listen port; everything
/// else about the server is fixed at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    /// HTTP port the SSE transport binds on.
    pub http_port: u16,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
        }
    }
}

impl GlobalConfig {
    /// Resolve configuration from the process environment.
    ///
    /// Reads `PORT`, falling back to 3000 when the variable is absent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `PORT` is set but is not a valid
    /// decimal port number.
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var(PORT_ENV) {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|err| AppError::Config(format!("invalid {PORT_ENV} value {raw:?}: {err}")))?,
            Err(_) => default_http_port(),
        };

        Ok(Self { http_port })
    }
}
