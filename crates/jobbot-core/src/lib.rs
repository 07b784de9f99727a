pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod policy;
pub mod service;
pub mod strategy;
pub mod throttle;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::ScraperConfig;
pub use dispatch::Dispatcher;
pub use error::AppError;
pub use models::{Anchor, Posting, StrategyKind};
pub use service::ExtractionService;
pub use throttle::{HostThrottle, ThrottleConfig};
pub use traits::{Fetcher, NullRenderer, PostingExtractor, RenderSession, Renderer};
