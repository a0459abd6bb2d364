pub mod server;

pub use server::{create_router, RunningServer, WebhookConfig, WebhookServer};
