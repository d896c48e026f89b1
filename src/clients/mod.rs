mod api;
mod mailbox;

pub use api::ApiClient;
pub use mailbox::MailpitClient;
