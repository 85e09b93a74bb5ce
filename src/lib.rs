pub mod config;
pub mod extract;
pub mod logging;
pub mod normalize;
pub mod output;

pub use config::{Config, EntryOrder, ExtraFieldPolicy, FileErrorPolicy, TextEncoding};
pub use normalize::{Record, SubjectReport};
