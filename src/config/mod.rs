pub mod schema;

#[allow(unused_imports)]
pub use schema::{Config, GatewayConfig, PersonaConfig, ReplyPoolsConfig, FALLBACK_API_KEY};
