use super::RequestsLoggingLevel;
use crate::listing::DEFAULT_PAGE_SIZE;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Events per page on the public listing and the load-more endpoint.
    pub page_size: u32,
    /// Offset applied to UTC when deciding which calendar date is "today".
    pub utc_offset_minutes: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            page_size: DEFAULT_PAGE_SIZE,
            utc_offset_minutes: 0,
        }
    }
}
