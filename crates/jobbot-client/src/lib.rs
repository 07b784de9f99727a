#[cfg(feature = "browser")]
pub mod browser;
pub mod fetcher;

#[cfg(feature = "browser")]
pub use browser::{BrowserRenderer, BrowserSession};
pub use fetcher::ReqwestFetcher;
