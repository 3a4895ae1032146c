mod spareroom_tests;
pub mod utils;
