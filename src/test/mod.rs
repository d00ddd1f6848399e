pub mod utils;

pub use utils::test_utils;

mod player;
mod sessions;
