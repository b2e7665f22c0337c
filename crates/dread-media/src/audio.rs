//! Audio helpers: silent fallback tracks and duration measurement.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::error::MediaResult;
use crate::fs_utils::write_atomic;
use crate::probe::get_duration;

/// Bit depth of synthesized audio.
pub const SILENT_BITS_PER_SAMPLE: u16 = 16;

/// Encode `seconds` of mono 16-bit PCM silence as a WAV file in memory.
pub fn silent_wav_bytes(seconds: f64, sample_rate: u32) -> MediaResult<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: SILENT_BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };
    let samples = (seconds.max(0.0) * sample_rate as f64).round() as u32;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        let mut samples_writer = writer.get_i16_writer(samples);
        for _ in 0..samples {
            samples_writer.write_sample(0i16);
        }
        samples_writer.flush()?;
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Write a silent WAV track of `seconds` to `path`.
pub async fn write_silent_wav(path: impl AsRef<Path>, seconds: f64, sample_rate: u32) -> MediaResult<()> {
    let path = path.as_ref();
    let bytes = silent_wav_bytes(seconds, sample_rate)?;
    write_atomic(path, &bytes).await?;
    debug!("Wrote {:.2}s of silence to {}", seconds, path.display());
    Ok(())
}

/// Measure the playback duration of an audio file in seconds.
///
/// WAV files are read from their header; anything else goes through FFprobe.
pub async fn measure_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    let is_wav = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if is_wav {
        match wav_duration(path) {
            Ok(seconds) => return Ok(seconds),
            Err(e) => debug!("WAV header unreadable for {}: {}, probing", path.display(), e),
        }
    }

    get_duration(path).await
}

fn wav_duration(path: &Path) -> MediaResult<f64> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_silent_wav_has_requested_duration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("silent_0.wav");

        write_silent_wav(&path, 10.2, 44_100).await.unwrap();

        let reader = WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.channels, 1);
        assert_eq!(reader.duration(), 449_820);

        let measured = measure_duration(&path).await.unwrap();
        assert!((measured - 10.2).abs() < 1e-3);
    }

    #[test]
    fn test_silent_wav_is_silent() {
        let bytes = silent_wav_bytes(0.01, 8_000).unwrap();
        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples.len(), 80);
        assert!(samples.iter().all(|s| *s == 0));
    }
}
