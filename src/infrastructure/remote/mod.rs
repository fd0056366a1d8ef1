pub mod http_api;
pub mod static_token;

pub use http_api::HttpParkingApi;
pub use static_token::StaticTokenProvider;
