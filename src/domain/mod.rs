pub mod dates;
pub mod filter;
pub mod listing;
pub mod normalize;

pub use filter::FilterPolicy;
pub use listing::{Listing, Source};
pub use normalize::normalize;
