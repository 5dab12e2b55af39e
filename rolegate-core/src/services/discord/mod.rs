pub mod embeds;
pub mod member_api;
pub mod router;
pub mod slashcommands;

pub use member_api::TwilightGuildMembers;
pub use router::InteractionRouter;
