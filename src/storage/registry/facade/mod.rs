//! Public registry API composing catalog, metadata store and transitioner

mod handle;
mod operations;


pub use handle::Registry;
