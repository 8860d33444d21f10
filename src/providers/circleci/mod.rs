pub mod client;
pub mod types;

pub use client::CircleCiClient;
pub use types::{ArtefactRef, BuildJob};
