pub mod buffer;
#[cfg(feature = "capture")]
pub mod capture;
#[cfg(feature = "capture")]
pub mod device;
pub mod resample;
pub mod ring;
pub mod wav;

pub use buffer::SampleBuffer;
#[cfg(feature = "capture")]
pub use capture::CaptureNode;
#[cfg(feature = "capture")]
pub use device::DeviceManager;
pub use resample::{resample_linear, LinearResampler};
pub use ring::{create_ring_buffer, RingSource};
pub use wav::{read_wav, read_wav_from};
