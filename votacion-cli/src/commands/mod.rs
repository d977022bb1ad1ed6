pub mod completion;
pub mod config;
pub mod route;
pub mod session;
pub mod surveys;
pub mod templates;
