pub mod app_state;
pub mod http;
pub mod user_id;
