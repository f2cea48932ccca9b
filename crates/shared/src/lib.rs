// Public modules
pub mod briefing;
pub mod cancel;
pub mod claude;
pub mod collector;
pub mod config;
pub mod fetcher;
pub mod io;
pub mod models;
pub mod parser;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use briefing::BriefingGenerator;
pub use cancel::CancelFlag;
pub use claude::{ClaudeClient, MessagesApi};
pub use collector::{BriefingCollector, CollectionReport};
pub use config::Config;
pub use fetcher::{FetchPolicy, SectionFetcher};
pub use io::{write_site, SiteFiles};
pub use models::{Section, SectionSpec, Story, DEFAULT_SECTIONS};
pub use parser::extract_stories;
