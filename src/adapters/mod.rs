// Adapters: concrete HTTP / SMTP implementations of the domain ports.

pub mod cris;
pub mod directory;
pub mod dsw;
pub mod http;
pub mod mailer;
pub mod registry;

pub use cris::CrisClient;
pub use directory::PdbClient;
pub use dsw::DswClient;
pub use mailer::SmtpMailer;
pub use registry::{FunderApiRegistry, SwecrisRegistry};
