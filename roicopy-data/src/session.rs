// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use roicopy_core::error::RoiCopyError;

use crate::store::OmeroLogin;

pub const SOURCE_SERVER_ENV: &str = "ROICOPY_SOURCE_SERVER";
pub const SOURCE_USERNAME_ENV: &str = "ROICOPY_SOURCE_USERNAME";
pub const SOURCE_PASSWORD_ENV: &str = "ROICOPY_SOURCE_PASSWORD";
pub const SERVER_ID_ENV: &str = "ROICOPY_SERVER_ID";

/// OMERO.web server index used when none is configured
pub const DEFAULT_SERVER_ID: u32 = 1;

/// Source credentials taken from the environment
pub fn source_login_from_env() -> Result<OmeroLogin, RoiCopyError> {
    source_login(|name| std::env::var(name).ok())
}

/// Server index taken from the environment
pub fn server_id_from_env() -> Result<u32, RoiCopyError> {
    server_id(|name| std::env::var(name).ok())
}

/// Build source credentials from a variable lookup
pub fn source_login<F>(lookup: F) -> Result<OmeroLogin, RoiCopyError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |name: &str| {
        lookup(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                RoiCopyError::ConfigError(format!(
                    "Environment variable {} must be set to log in to the source server",
                    name
                ))
            })
    };

    Ok(OmeroLogin {
        server: required(SOURCE_SERVER_ENV)?,
        username: required(SOURCE_USERNAME_ENV)?,
        password: required(SOURCE_PASSWORD_ENV)?,
        server_id: server_id(&lookup)?,
    })
}

fn server_id<F>(lookup: F) -> Result<u32, RoiCopyError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(SERVER_ID_ENV).filter(|value| !value.is_empty()) {
        Some(value) => value.trim().parse().map_err(|_| {
            RoiCopyError::ConfigError(format!(
                "{} must be a positive integer, got '{}'",
                SERVER_ID_ENV, value
            ))
        }),
        None => Ok(DEFAULT_SERVER_ID),
    }
}
