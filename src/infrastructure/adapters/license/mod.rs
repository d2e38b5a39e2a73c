//! Content License Adapter

mod pass_through_license;

pub use pass_through_license::PassThroughLicense;
