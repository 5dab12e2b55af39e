pub mod api;
pub mod clock;
pub mod repository_traits;
