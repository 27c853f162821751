use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// JSON array file holding every recorded choice
    #[serde(default = "default_choices_file")]
    pub choices_file: String,

    /// JSON file backing the client session state
    #[serde(default = "default_session_file")]
    pub session_file: String,

    /// Bundled catalog file, rewritten by the cover backfill tool
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,

    /// Google Books API base URL
    #[serde(default = "default_google_books_api_url")]
    pub google_books_api_url: String,

    /// Optional Google Books API key (raises quota)
    #[serde(default)]
    pub google_books_api_key: Option<String>,

    /// Results requested per catalog search
    #[serde(default = "default_search_max_results")]
    pub search_max_results: u32,

    /// Fixed seed for the recommender jitter; random when unset
    #[serde(default)]
    pub recommender_seed: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_choices_file() -> String {
    "choices.json".to_string()
}

fn default_session_file() -> String {
    "session.json".to_string()
}

fn default_catalog_file() -> String {
    "data/books.json".to_string()
}

fn default_google_books_api_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

fn default_search_max_results() -> u32 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            choices_file: default_choices_file(),
            session_file: default_session_file(),
            catalog_file: default_catalog_file(),
            google_books_api_url: default_google_books_api_url(),
            google_books_api_key: None,
            search_max_results: default_search_max_results(),
            recommender_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Treats an empty `GOOGLE_BOOKS_API_KEY` as unset
    pub fn api_key(&self) -> Option<String> {
        self.google_books_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }
}
