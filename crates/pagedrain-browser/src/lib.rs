//! Browser driver that exhausts infinite-scroll pages.
//!
//! Loads a page in headless Chromium, scrolls it (or clicks its
//! "load more" control) until no further content arrives, and hands back
//! the rendered HTML together with how the scroll session ended.

pub mod actions;
pub mod engine;
pub mod error;
pub mod exhaust;

pub use actions::{validate_url, PageAction, PageActions};
pub use engine::{BrowserEngine, FetchRequest, RenderedPage};
pub use error::{BrowserError, Result};
pub use exhaust::ScrollExhauster;
