//! Audio artifact concatenation.
//!
//! Chunk synthesis produces one encoded file per chunk; this module
//! stitches them into the final artifact. MP3 frame streams (and chained
//! Ogg pages) from the same encoder settings tolerate byte-level
//! concatenation once leading ID3v2 tags are skipped; LINEAR16 WAV files
//! are decoded and re-encoded through hound.

use std::fs;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("unsupported container format '{0}'")]
    UnsupportedFormat(String),

    #[error("WAV spec mismatch between {} and {}", first.display(), second.display())]
    SpecMismatch { first: PathBuf, second: PathBuf },

    #[error("WAV codec error: {0}")]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Concatenate `clips` in order into `output`.
///
/// The container format is inferred from the output extension; every clip
/// must share it. Does nothing when `clips` is empty.
pub fn concatenate(clips: &[PathBuf], output: &Path) -> Result<(), MergeError> {
    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "mp3" | "ogg" => concat_stream(clips, output),
        "wav" => concat_wav(clips, output),
        other => Err(MergeError::UnsupportedFormat(other.to_string())),
    }
}

/// Byte-level concatenation for self-framing streams.
fn concat_stream(clips: &[PathBuf], output: &Path) -> Result<(), MergeError> {
    let mut merged = Vec::new();
    for (i, clip) in clips.iter().enumerate() {
        let bytes = fs::read(clip)?;
        if i == 0 {
            merged.extend_from_slice(&bytes);
        } else {
            merged.extend_from_slice(after_id3v2(&bytes));
        }
    }
    fs::write(output, merged)?;
    Ok(())
}

/// Skip a leading ID3v2 tag: "ID3", version (2 bytes), flags (1 byte),
/// synchsafe size (4 bytes), then `size` bytes of tag payload.
fn after_id3v2(bytes: &[u8]) -> &[u8] {
    if bytes.len() >= 10 && &bytes[..3] == b"ID3" {
        let size = bytes[6..10]
            .iter()
            .fold(0usize, |acc, b| (acc << 7) | usize::from(b & 0x7F));
        if let Some(rest) = bytes.get(10 + size..) {
            return rest;
        }
    }
    bytes
}

fn concat_wav(clips: &[PathBuf], output: &Path) -> Result<(), MergeError> {
    let Some((first, rest)) = clips.split_first() else {
        return Ok(());
    };

    let mut reader = hound::WavReader::open(first)?;
    let spec = reader.spec();
    let mut writer = hound::WavWriter::create(output, spec)?;
    copy_samples(&mut reader, &mut writer)?;

    for clip in rest {
        let mut reader = hound::WavReader::open(clip)?;
        if reader.spec() != spec {
            return Err(MergeError::SpecMismatch {
                first: first.clone(),
                second: clip.clone(),
            });
        }
        copy_samples(&mut reader, &mut writer)?;
    }

    writer.finalize()?;
    Ok(())
}

/// LINEAR16 output from the service is 16-bit PCM.
fn copy_samples<R: Read, W: Write + Seek>(
    reader: &mut hound::WavReader<R>,
    writer: &mut hound::WavWriter<W>,
) -> Result<(), hound::Error> {
    for sample in reader.samples::<i16>() {
        writer.write_sample(sample?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn wav_concat_appends_samples_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        let out = dir.path().join("out.wav");
        write_wav(&a, &[1, 2, 3]);
        write_wav(&b, &[4, 5]);

        concatenate(&[a, b], &out).unwrap();

        let mut reader = hound::WavReader::open(&out).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn wav_spec_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_wav(&a, &[1]);

        let other_spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&b, other_spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let result = concatenate(&[a, b], &dir.path().join("out.wav"));
        assert!(matches!(result, Err(MergeError::SpecMismatch { .. })));
    }

    #[test]
    fn mp3_concat_is_byte_append_with_id3_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mp3");
        let b = dir.path().join("b.mp3");
        let out = dir.path().join("out.mp3");

        // Second clip carries a 4-byte ID3v2 tag payload ("JUNK")
        let mut tagged = b"ID3\x04\x00\x00\x00\x00\x00\x04JUNK".to_vec();
        tagged.extend_from_slice(b"BBBB");
        fs::write(&a, b"AAAA").unwrap();
        fs::write(&b, &tagged).unwrap();

        concatenate(&[a, b], &out).unwrap();
        assert_eq!(fs::read(&out).unwrap(), b"AAAABBBB");
    }

    #[test]
    fn id3_stripping_ignores_tags_mid_stream() {
        let bytes = b"AAID3zzzz";
        assert_eq!(after_id3v2(bytes), bytes);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let result = concatenate(&[], &dir.path().join("out.flac"));
        assert!(matches!(result, Err(MergeError::UnsupportedFormat(_))));
    }
}
