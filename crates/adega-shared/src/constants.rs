/// Application name
pub const APP_NAME: &str = "Diário de Vinhos";

/// Tagline shown under the application title
pub const APP_TAGLINE: &str = "Registre. Avalie. Compartilhe.";

/// Document-store collection holding the shared cellar
pub const WINES_COLLECTION: &str = "wines";

/// Lowest accepted rating score (inclusive)
pub const MIN_SCORE: u8 = 1;

/// Highest accepted rating score (inclusive)
pub const MAX_SCORE: u8 = 10;

/// Maximum inline photo payload in bytes, before base64 expansion.
/// Kept under the document-size ceiling of the managed store (1 MiB).
pub const MAX_PHOTO_BYTES: usize = 900 * 1024;

/// Default collection snapshot poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Capacity of the session/snapshot/event fan-out channels
pub const CHANNEL_CAPACITY: usize = 256;
