pub mod codec;
pub mod error;
pub mod keys;
pub mod models;
pub mod normalize;
pub mod query;
pub mod response;
pub mod state;
pub mod timestamp;
