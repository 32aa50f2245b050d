// Service modules (daemon functionality)
pub mod http_server;
pub mod process;
pub mod requests;
pub mod service_config;
pub mod service_state;

// App state (configuration, paths)
pub mod state;

// Re-exports for consumers (CLI, tests)
pub use process::{spawn_service, start_service, ShutdownHandle};
pub use requests::{Dispatch, RequestError};
pub use service_config::Config as ServiceConfig;
pub use service_state::{State as ServiceState, StateSetupError};
pub use state::{AppConfig, AppState, ProfileConfig, StateError};
