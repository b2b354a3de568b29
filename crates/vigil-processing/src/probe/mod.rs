//! Image header probing

mod processor;

pub use processor::ImageProcessor;
