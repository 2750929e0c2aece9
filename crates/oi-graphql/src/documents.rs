//! GraphQL documents for the crawler backend's fixed schema.
//!
//! The backend still exposes the author column under its historical
//! spelling `auther`; the normalizer accepts either key.

/// Query returning every stored article.
pub const SCAN: &str = "query Scan {
  scan { id title auther media url summary createdAt crawledAt }
}";

/// Mutation that re-crawls every source and stores the result.
pub const FULL_CRAWL_AND_STORE: &str = "mutation FullCrawlAndStore {
  fullCrawlAndStore { id title auther media url summary createdAt crawledAt }
}";

/// Query comparing the newest stored article with the newest upstream one.
/// Returns a bare boolean.
pub const IS_LATEST: &str = "query IsLatest { isLatest }";

/// Mutation that crawls only what is newer than the latest stored article
/// and returns the newly stored rows.
pub const CRAWL_AND_STORE: &str = "mutation CrawlAndStore {
  crawlAndStore { id title auther media url summary createdAt crawledAt }
}";
