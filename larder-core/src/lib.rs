pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod import;
pub mod library;
pub mod normalize;
pub mod share;
pub mod store;
pub mod text;
pub mod types;
pub mod vault;

pub use config::{Config, ConfigBuilder};
pub use error::{ExtractError, FetchError, ImportError, LibraryError, StoreError, VaultError};
pub use extract::extract_recipe;
pub use http::{MockClient, MockResponse, Relay, RelayClient, Retriever};
pub use import::{ImportOutcome, RecipeImporter};
pub use library::{RecipeBook, RecipeEdit};
pub use share::shared_url;
pub use store::{JsonFileStore, LocalStores, MemoryStore, RecordStore};
pub use text::extract_from_text;
pub use types::{
    EncryptedEnvelope, Extraction, ExtractionMethod, Recipe, VaultEntry, DEFAULT_ENTRY_TITLE,
    DEFAULT_TITLE,
};
pub use vault::{KdfParams, Vault, VaultStatus};
