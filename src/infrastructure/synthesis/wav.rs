//! Minimal RIFF/WAVE container handling for 16-bit mono PCM.
//!
//! Engines that produce WAV hand the executor raw samples; the
//! container is written exactly once, around the fully concatenated
//! sample stream, so multi-chunk jobs yield a single well-formed file.

/// Wrap raw 16-bit little-endian mono samples in a WAV container.
pub fn encode_pcm16(sample_rate: u32, samples: &[u8]) -> Vec<u8> {
    let data_len = samples.len();
    let mut wav = Vec::with_capacity(44 + data_len);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk: PCM, mono, 16-bit
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_len as u32).to_le_bytes());
    wav.extend_from_slice(samples);

    wav
}

/// Pull the sample rate and raw sample bytes out of a PCM 16-bit mono
/// WAV file, walking the chunk list so extra chunks (LIST, fact) in
/// upstream-produced files are tolerated.
pub fn extract_pcm16(bytes: &[u8]) -> Result<(u32, Vec<u8>), String> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err("not a RIFF/WAVE file".to_string());
    }

    let mut sample_rate = None;
    let mut data = None;
    let mut offset = 12;

    while offset + 8 <= bytes.len() {
        let chunk_id = &bytes[offset..offset + 4];
        let chunk_len = u32::from_le_bytes(
            bytes[offset + 4..offset + 8]
                .try_into()
                .map_err(|_| "truncated chunk header".to_string())?,
        ) as usize;
        let body_start = offset + 8;
        let body_end = body_start + chunk_len;
        if body_end > bytes.len() {
            return Err("chunk extends past end of file".to_string());
        }
        let body = &bytes[body_start..body_end];

        match chunk_id {
            b"fmt " => {
                if chunk_len < 16 {
                    return Err("fmt chunk too short".to_string());
                }
                let audio_format = u16::from_le_bytes([body[0], body[1]]);
                let channels = u16::from_le_bytes([body[2], body[3]]);
                let bits = u16::from_le_bytes([body[14], body[15]]);
                if audio_format != 1 || channels != 1 || bits != 16 {
                    return Err(format!(
                        "unsupported WAV format (format={audio_format}, channels={channels}, bits={bits}); expected 16-bit mono PCM"
                    ));
                }
                sample_rate = Some(u32::from_le_bytes([body[4], body[5], body[6], body[7]]));
            }
            b"data" => {
                data = Some(body.to_vec());
            }
            _ => {}
        }

        // Chunk bodies are padded to even length
        offset = body_end + (chunk_len & 1);
    }

    match (sample_rate, data) {
        (Some(rate), Some(samples)) => Ok((rate, samples)),
        (None, _) => Err("missing fmt chunk".to_string()),
        (_, None) => Err("missing data chunk".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_extract_round_trip() {
        let samples: Vec<u8> = (0u16..500).flat_map(|s| s.to_le_bytes()).collect();
        let wav = encode_pcm16(22_050, &samples);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len());
        // RIFF size covers everything after the first 8 bytes
        let declared = u32::from_le_bytes(wav[4..8].try_into().unwrap()) as usize;
        assert_eq!(declared, wav.len() - 8);

        let (rate, extracted) = extract_pcm16(&wav).unwrap();
        assert_eq!(rate, 22_050);
        assert_eq!(extracted, samples);
    }

    #[test]
    fn test_extract_rejects_non_wav_input() {
        assert!(extract_pcm16(b"not audio at all").is_err());
        assert!(extract_pcm16(&[]).is_err());
    }

    #[test]
    fn test_extract_rejects_stereo() {
        let mut wav = encode_pcm16(22_050, &[0u8; 4]);
        // Flip the channel count to 2
        wav[22] = 2;
        let err = extract_pcm16(&wav).unwrap_err();
        assert!(err.contains("channels=2"), "{err}");
    }

    #[test]
    fn test_extract_skips_unknown_chunks() {
        let samples = [1u8, 0, 2, 0];
        let wav = encode_pcm16(16_000, &samples);

        // Splice a LIST chunk between fmt and data
        let mut spliced = wav[..36].to_vec();
        spliced.extend_from_slice(b"LIST");
        spliced.extend_from_slice(&4u32.to_le_bytes());
        spliced.extend_from_slice(b"INFO");
        spliced.extend_from_slice(&wav[36..]);
        let riff_len = (spliced.len() - 8) as u32;
        spliced[4..8].copy_from_slice(&riff_len.to_le_bytes());

        let (rate, extracted) = extract_pcm16(&spliced).unwrap();
        assert_eq!(rate, 16_000);
        assert_eq!(extracted, samples);
    }
}
