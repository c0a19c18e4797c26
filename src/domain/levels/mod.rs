//! Audio level samples and their display transforms

pub mod downsample;
pub mod sample;
pub mod scale;
pub mod sparkline;

pub use downsample::downsample;
pub use sample::LevelSample;
pub use scale::MeteringScale;
pub use sparkline::render_bars;
