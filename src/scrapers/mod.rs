pub mod amazon;
pub mod category;
pub mod detail;
