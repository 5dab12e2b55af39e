pub mod pagination;
pub mod registry;

pub use pagination::{
    category_summary, total_pages, AdvanceRejected, CategoryCount, Direction, Page, PresentationSession,
    PAGE_SIZE, SESSION_IDLE_TIMEOUT_SECS, SUMMARY_LIMIT,
};
pub use registry::SessionRegistry;
