/// Constants module to avoid magic numbers in the codebase

// Storage keys
pub const CHATS_STORAGE_KEY: &str = "aiChats";
pub const DARK_MODE_STORAGE_KEY: &str = "darkMode";
pub const DARK_MODE_ENABLED: &str = "enabled";
pub const DARK_MODE_DISABLED: &str = "disabled";

// Session defaults
pub const SESSION_ID_PREFIX: &str = "chat_";
pub const DEFAULT_SESSION_TITLE: &str = "New Conversation";
pub const TITLE_MAX_CHARS: usize = 30;
pub const TITLE_ELLIPSIS: &str = "...";

// Conversation text
pub const GREETING_TEXT: &str = "A new conversation has started. How can I assist you today?";
pub const ERROR_REPLY_PREFIX: &str = "Sorry, I ran into a problem: ";
pub const CLEAR_ALL_PROMPT: &str =
    "Are you sure you want to delete ALL chat history? This cannot be undone.";

// Network Configuration
pub const DEFAULT_GENERATE_URL: &str = "http://127.0.0.1:5000/api/generate";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 600; // 10 minutes for large model requests

// UI Configuration
pub const UI_REFRESH_INTERVAL_MS: u64 = 50;
pub const UI_SCROLL_LINES: u16 = 3;

// Files
pub const APP_NAME: &str = "parley";
pub const LOCAL_CONFIG_PATH: &str = ".parley/config.toml";
pub const LOG_FILE_NAME: &str = "parley.log";
pub const ENV_PREFIX: &str = "PARLEY_";
