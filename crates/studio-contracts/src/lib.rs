pub mod ad_copy;
pub mod compiler;
pub mod errors;
pub mod events;
pub mod models;
pub mod payload;
pub mod settings;
