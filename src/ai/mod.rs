pub mod context;
pub mod detector;
pub mod emotion;
pub mod knowledge;
pub mod personality;
pub mod prompts;
pub mod sanitize;
