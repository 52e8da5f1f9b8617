//! Localhost preview server for generated transcript sites.
//!
//! The transcript exporter writes a finished static tree (HTML, Markdown,
//! assets) to disk; this crate serves that tree read-only over plain HTTP so
//! it can be checked in a browser before being published. One request flows
//! through four small pieces:
//!
//! - [`resolve`]: turns the request path into a filesystem path and proves
//!   it cannot escape the serving root
//! - [`locate`]: finds the concrete file (exact hit or `index.html`
//!   fallback)
//! - [`conditional`]: fingerprints the content and answers `304` or `200`
//!   with the right caching headers
//! - [`dispatch`]: the per-request state machine tying the above together
//!   and mapping every failure to a status code
//!
//! [`server`] wraps the dispatcher in a listener with explicit,
//! token-driven shutdown.

mod conditional;
mod dispatch;
mod locate;
mod mime;
mod resolve;
mod server;

pub use dispatch::Dispatcher;
pub use server::BoundServer;
pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;
pub use server::StartError;
