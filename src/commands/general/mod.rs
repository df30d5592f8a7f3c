pub mod ping;

pub use ping::ping;
