/// Route components shared across crates
pub const AUTH_ROUTE_COMPONENT: &str = "auth";
pub const SPACES_ROUTE_COMPONENT: &str = "spaces";
pub const VERSION_ROUTE_COMPONENT: &str = "version";
pub const SYSTEM_CONFIG_ROUTE_COMPONENT: &str = "system-config";

/// Request headers carrying credential material
pub const API_KEY_HEADER: &str = "x-api-key";
pub const SPACE_PASSWORD_HEADER: &str = "x-space-password";

/// Version categories bumped by the built-in handlers
pub const SPACES_CATEGORY: &str = "spaces";
pub const FOLDERS_CATEGORY: &str = "folders";
pub const BOOKMARKS_CATEGORY: &str = "bookmarks";
pub const DEFAULT_CATEGORIES: [&str; 3] = [SPACES_CATEGORY, FOLDERS_CATEGORY, BOOKMARKS_CATEGORY];

/// Name of the space created alongside the first account
pub const DEFAULT_SPACE_NAME: &str = "Default";
