mod device;
mod piper;
mod stream;
mod synthetic;
pub mod wav;

use std::path::Path;

pub use device::Device;
pub use piper::PiperEngine;
pub use stream::{ChunkMetrics, ChunkStream, StreamedChunk};
pub use synthetic::{SyntheticConfig, SyntheticEngine};

/// A loaded streaming synthesis engine.
///
/// `stream` takes `&mut self`: an engine keeps internal state between chunks and
/// two concurrent streams would interleave it. Callers that share one engine
/// between threads must serialize access themselves.
pub trait StreamingEngine: Send {
    /// Output sample rate. Fixed for the lifetime of the loaded engine.
    fn sample_rate(&self) -> u32;

    /// Whether `stream` honours a reference voice.
    fn supports_voice_cloning(&self) -> bool {
        false
    }

    /// Start synthesizing `text`, optionally imitating the voice in
    /// `reference_voice`. The returned sequence is lazy and single-pass.
    fn stream<'a>(
        &'a mut self,
        text: &str,
        reference_voice: Option<&Path>,
    ) -> anyhow::Result<ChunkStream<'a>>;
}

impl<E: StreamingEngine + ?Sized> StreamingEngine for Box<E> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn supports_voice_cloning(&self) -> bool {
        (**self).supports_voice_cloning()
    }

    fn stream<'a>(
        &'a mut self,
        text: &str,
        reference_voice: Option<&Path>,
    ) -> anyhow::Result<ChunkStream<'a>> {
        (**self).stream(text, reference_voice)
    }
}
