mod deploy;
mod doctor;
mod env;
mod init;
mod vercel;

pub use deploy::deploy;
pub use doctor::doctor;
pub use env::write_env;
pub use init::init_project;
pub use vercel::{VercelArgs, vercel};
