use crate::archive::error::ArchiveError;
use log::info;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tokio::sync::OnceCell;

pub const URS_URL: &str = "https://urs.earthdata.nasa.gov";

/// How to authenticate against Earthdata Login.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A user token generated in the Earthdata profile.
    Token(String),
    /// Username and password, exchanged for a token on first use.
    Login { username: String, password: String },
}

impl Credentials {
    /// Reads `EARTHDATA_TOKEN`, or else `EARTHDATA_USERNAME` and `EARTHDATA_PASSWORD`,
    /// through `lookup`. Empty values count as missing.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ArchiveError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(token) = read("EARTHDATA_TOKEN") {
            return Ok(Credentials::Token(token));
        }
        match (read("EARTHDATA_USERNAME"), read("EARTHDATA_PASSWORD")) {
            (Some(username), Some(password)) => Ok(Credentials::Login { username, password }),
            _ => Err(ArchiveError::MissingCredentials),
        }
    }

    pub fn from_env() -> Result<Self, ArchiveError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(***)"),
            Credentials::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// An Earthdata Login session. The bearer token is fetched at most once per
/// session and shared by every request made through it.
#[derive(Debug)]
pub struct EarthdataSession {
    client: Client,
    urs_url: String,
    credentials: Credentials,
    token: OnceCell<String>,
}

impl EarthdataSession {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_urs_url(credentials, URS_URL)
    }

    pub fn with_urs_url(credentials: Credentials, urs_url: impl Into<String>) -> Self {
        let token = match &credentials {
            Credentials::Token(token) => OnceCell::new_with(Some(token.clone())),
            Credentials::Login { .. } => OnceCell::new(),
        };
        Self {
            client: Client::new(),
            urs_url: urs_url.into().trim_end_matches('/').to_string(),
            credentials,
            token,
        }
    }

    pub fn from_env() -> Result<Self, ArchiveError> {
        Ok(Self::new(Credentials::from_env()?))
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.initialized()
    }

    pub async fn bearer_token(&self) -> Result<&str, ArchiveError> {
        self.token
            .get_or_try_init(|| self.login())
            .await
            .map(String::as_str)
    }

    async fn login(&self) -> Result<String, ArchiveError> {
        let Credentials::Login { username, password } = &self.credentials else {
            return Err(ArchiveError::MissingCredentials);
        };
        let url = format!("{}/api/users/find_or_create_token", self.urs_url);
        info!("Logging in to Earthdata as {}", username);

        let response = self
            .client
            .post(&url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| ArchiveError::NetworkRequest(url.clone(), e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Login(format!("{status}: {body}")));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ArchiveError::Login(e.to_string()))?;
        Ok(token.access_token)
    }
}
