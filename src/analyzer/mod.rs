//! Spectrum analyzer and response-curve display pipeline.
//!
//! Audio thread side: [`SampleCollector`] cuts each channel into blocks.
//! Display side: [`PathProducer`] turns those blocks into spectra and
//! polylines, and [`ResponseCurve`] drives both channels plus the filter
//! response at the refresh rate.

pub mod collector;
pub mod fft_data;
pub mod path;
pub mod path_producer;
pub mod response;

pub use collector::SampleCollector;
pub use fft_data::{AnalyzerConfig, FftDataGenerator, FftOrder, WindowKind};
pub use path::{AnalyzerPath, AnalyzerPathGenerator, PathElement, Point, Rect};
pub use path_producer::PathProducer;
pub use response::{analysis_area, render_area, ResponseCurve, REFRESH_RATE_HZ};
