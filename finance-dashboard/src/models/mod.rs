pub mod identity;

pub use identity::{keys, PendingLogin, ProviderProfile};
