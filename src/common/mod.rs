pub mod responses;
pub mod types;

pub use responses::{Acknowledged, ErrorBody, MutualUsers, UserWithChats};
pub use types::{Chat, Dataset, User};
