// Re-export model modules
mod currencies;
mod history;

pub use currencies::*;
pub use history::*;
