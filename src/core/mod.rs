pub mod duration;
pub mod pipeline;
pub mod report;
pub mod request;
pub mod search;
pub mod storage;
pub mod transcript;

pub use pipeline::*;
pub use search::*;
pub use transcript::*;
