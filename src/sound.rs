//! Sound effects. Real audio needs the `sound` feature; without it every
//! effect is silent.

pub use imp::Sfx;

#[cfg(feature = "sound")]
mod imp {
    use anyhow::{Context, Result};
    use fundsp::prelude::*;
    use rodio::{OutputStream, OutputStreamHandle, Sink, buffer::SamplesBuffer};

    const SAMPLE_RATE: u32 = 44_100;

    pub struct Sfx {
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    impl Sfx {
        pub fn open() -> Result<Self> {
            let (stream, handle) =
                OutputStream::try_default().context("opening default audio output")?;
            Ok(Self {
                _stream: stream,
                handle,
            })
        }

        /// Falling sawtooth, 400 Hz down to 80 Hz.
        pub fn death(&self) {
            self.play(sweep(400.0, 80.0, 0.4, 0.15, 0.5));
        }

        /// Short rising chirp.
        pub fn flap(&self) {
            self.play(sweep(320.0, 640.0, 0.06, 0.06, 0.08));
        }

        fn play(&self, samples: Vec<f32>) {
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
                    sink.detach(); // Play in background
                }
                Err(err) => tracing::warn!("audio sink unavailable: {err}"),
            }
        }
    }

    /// Sawtooth gliding from `from` to `to` Hz over `glide` seconds, fading
    /// linearly from `gain` to silence over `length` seconds.
    fn sweep(from: f64, to: f64, glide: f64, gain: f64, length: f64) -> Vec<f32> {
        let freq = shared(from as f32);
        let mut osc = var(&freq) >> saw();
        let n = (f64::from(SAMPLE_RATE) * length) as usize;
        (0..n)
            .map(|i| {
                let t = i as f64 / f64::from(SAMPLE_RATE);
                let k = (t / glide).min(1.0);
                freq.set_value((from + (to - from) * k) as f32);
                let g = gain * (1.0 - t / length);
                osc.get_mono() as f32 * g as f32
            })
            .collect()
    }
}

#[cfg(not(feature = "sound"))]
mod imp {
    use anyhow::Result;

    pub struct Sfx;

    impl Sfx {
        pub fn open() -> Result<Self> {
            Ok(Self)
        }

        pub fn death(&self) {}

        pub fn flap(&self) {}
    }
}
