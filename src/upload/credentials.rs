use eframe::Storage;

/// Key of the token in the persisted key/value storage. Owned by whoever logs the user in.
pub const AUTH_TOKEN_KEY: &str = "authorization_token";

/// Supplies the token sent with destination requests.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Token read once from persisted storage; never written back or refreshed.
#[derive(Debug, Clone, Default)]
pub struct StoredToken {
    token: Option<String>,
}

impl StoredToken {
    pub fn from_storage(storage: Option<&dyn Storage>) -> Self {
        let token = storage
            .and_then(|storage| storage.get_string(AUTH_TOKEN_KEY))
            .filter(|token| !token.is_empty());

        match &token {
            Some(_) => log::info!("Found {AUTH_TOKEN_KEY} in storage"),
            None => log::warn!("No {AUTH_TOKEN_KEY} in storage, requests go out unauthenticated"),
        }

        Self { token }
    }
}

impl CredentialProvider for StoredToken {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Fixed token, mostly for tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone().filter(|token| !token.is_empty())
    }
}
