pub mod live_feed;
pub mod markup;
pub mod models;
pub mod primary;
pub mod scores_feed;
pub mod teams;
pub mod text;
