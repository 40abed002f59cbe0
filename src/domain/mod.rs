pub mod page;

pub use page::{normalize_url, ExtractionMethod, PageSnapshot, ScrapeRequest, ScrapedData, Tier};
