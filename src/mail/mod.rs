pub mod mailer;
pub mod template;

pub use mailer::Mailer;
