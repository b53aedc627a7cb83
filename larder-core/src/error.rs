use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Relay returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("{0}")]
    Unavailable(String),
}

/// Failure of a single extraction tier.
///
/// These never reach the user directly: the importer recovers from them by
/// moving on to the next tier.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No Recipe found in structured data")]
    NoRecipe,

    #[error("Invalid JSON-LD: {0}")]
    InvalidJson(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store file is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Sorry, we could not fetch that page. You can enter the ingredients and steps manually. ({0})")]
    Fetch(#[from] FetchError),

    #[error("Could not extract ingredients or instructions from {0}")]
    NoContent(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Import failed: invalid JSON ({0})")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Recipe not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum VaultError {
    /// Password rejected before any state change.
    #[error("{0}")]
    Validation(String),

    #[error("Incorrect vault password")]
    Auth,

    #[error("No vault has been created yet")]
    NotInitialized,

    /// Operation is not valid in the current session state.
    #[error("Vault is {0}")]
    State(&'static str),

    #[error("Failed to decrypt entry {id}")]
    Decryption { id: String },

    #[error("Vault crypto failure: {0}")]
    Crypto(String),

    #[error("Stored credential material is corrupt: {0}")]
    CorruptCredential(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
