pub mod api;
pub mod demo_feed;
pub mod dispatch;
pub mod http_client;
pub mod persist;
pub mod predictions;
pub mod session;
pub mod state;
pub mod validation;
