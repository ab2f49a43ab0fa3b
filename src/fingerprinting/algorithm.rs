use std::collections::HashMap;
use std::error::Error;

use chfft::RFft1D;

use crate::decode;
use crate::fingerprinting::hanning::hanning_window_2048;
use crate::fingerprinting::ring_buffer::RingBuffer;
use crate::fingerprinting::signature_format::{DecodedSignature, FrequencyBand, FrequencyPeak};

const SAMPLE_RATE_HZ: u32 = 16000;
const DEFAULT_MAX_TIME_SECONDS: f32 = 3.1;
const DEFAULT_MAX_PEAKS: usize = 255;

/// Reduces a stream of 16 kHz mono PCM samples to banded frequency peaks.
///
/// Feed samples in with [`feed_input`](Self::feed_input) at whatever
/// cadence they arrive, then drain completed signatures with
/// [`get_next_signature`](Self::get_next_signature). A signature is
/// considered complete once it covers at least `max_time_seconds` of
/// audio, unless it is still short on peaks, in which case accumulation
/// continues until `max_peaks` is reached.
pub struct SignatureGenerator {
    input_pending_processing: Vec<i16>,
    samples_processed: usize,

    ring_buffer_of_samples: RingBuffer<i16>,
    fft_outputs: RingBuffer<Vec<f32>>,
    spread_fft_outputs: RingBuffer<Vec<f32>>,

    fft_object: RFft1D<f32>,
    hanning_window: Vec<f32>,

    max_time_seconds: f32,
    max_peaks: usize,

    next_signature: DecodedSignature,
}

impl SignatureGenerator {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_TIME_SECONDS, DEFAULT_MAX_PEAKS)
    }

    /// A generator that keeps accumulating peaks for up to `max_time_seconds`
    /// of audio before a signature is considered complete, rather than the
    /// default 3.1s. The file driver raises this to 12s so a single
    /// signature covers its whole centered excerpt.
    pub fn with_max_time_seconds(max_time_seconds: f32) -> Self {
        Self::with_limits(max_time_seconds, DEFAULT_MAX_PEAKS)
    }

    /// Advance the input cursor past `count` queued samples without
    /// running them through the pipeline, capped at the amount actually
    /// queued. Used by the file driver to start fingerprinting partway
    /// through a long track without copying or truncating the buffer.
    pub fn advance_unprocessed_samples(&mut self, count: usize) {
        self.samples_processed = (self.samples_processed + count).min(self.input_pending_processing.len());
    }

    fn with_limits(max_time_seconds: f32, max_peaks: usize) -> Self {
        SignatureGenerator {
            input_pending_processing: Vec::new(),
            samples_processed: 0,

            ring_buffer_of_samples: RingBuffer::new(2048, 0i16),
            fft_outputs: RingBuffer::new(256, vec![0.0f32; 1025]),
            spread_fft_outputs: RingBuffer::new(256, vec![0.0f32; 1025]),

            fft_object: RFft1D::<f32>::new(2048),
            hanning_window: hanning_window_2048(),

            max_time_seconds,
            max_peaks,

            next_signature: DecodedSignature {
                sample_rate_hz: SAMPLE_RATE_HZ,
                number_samples: 0,
                frequency_band_to_sound_peaks: HashMap::new(),
            },
        }
    }

    /// Queue samples for processing. Does not block and does not itself
    /// produce a signature; call [`get_next_signature`](Self::get_next_signature)
    /// to drain completed ones.
    pub fn feed_input(&mut self, s16le_mono_samples: &[i16]) {
        self.input_pending_processing.extend_from_slice(s16le_mono_samples);
    }

    /// Process as much queued input as needed to complete a signature, and
    /// return it. Returns `None` if fewer than 128 samples are queued.
    pub fn get_next_signature(&mut self) -> Option<DecodedSignature> {
        if self.input_pending_processing.len() - self.samples_processed < 128 {
            return None;
        }

        while self.input_pending_processing.len() - self.samples_processed >= 128
            && (self.signature_duration_seconds() < self.max_time_seconds || self.next_signature.total_peaks() < self.max_peaks)
        {
            let chunk_start = self.samples_processed;
            let chunk = self.input_pending_processing[chunk_start..chunk_start + 128].to_vec();
            self.process_input(&chunk);
            self.samples_processed += 128;
        }

        let returned_signature = std::mem::replace(
            &mut self.next_signature,
            DecodedSignature {
                sample_rate_hz: SAMPLE_RATE_HZ,
                number_samples: 0,
                frequency_band_to_sound_peaks: HashMap::new(),
            },
        );

        self.ring_buffer_of_samples = RingBuffer::new(2048, 0i16);
        self.fft_outputs = RingBuffer::new(256, vec![0.0f32; 1025]);
        self.spread_fft_outputs = RingBuffer::new(256, vec![0.0f32; 1025]);

        Some(returned_signature)
    }

    fn signature_duration_seconds(&self) -> f32 {
        self.next_signature.number_samples as f32 / self.next_signature.sample_rate_hz as f32
    }

    fn process_input(&mut self, batch_of_128_samples: &[i16]) {
        self.next_signature.number_samples += batch_of_128_samples.len() as u32;

        self.do_fft(batch_of_128_samples);
        self.do_peak_spreading_and_recognition();
    }

    fn do_fft(&mut self, batch_of_128_samples: &[i16]) {
        for &sample in batch_of_128_samples {
            self.ring_buffer_of_samples.append(sample);
        }

        let position = self.ring_buffer_of_samples.position as i64;
        let mut windowed = vec![0.0f32; 2048];
        for (i, multiplier) in self.hanning_window.iter().enumerate() {
            windowed[i] = *self.ring_buffer_of_samples.get(position + i as i64) as f32 * multiplier;
        }

        let complex_fft_results = self.fft_object.forward(&windowed);
        debug_assert_eq!(complex_fft_results.len(), 1025);

        let mut magnitude = vec![0.0f32; 1025];
        for (index, bin) in complex_fft_results.iter().enumerate() {
            magnitude[index] = ((bin.re.powi(2) + bin.im.powi(2)) / ((1 << 17) as f32)).max(1e-10);
        }

        self.fft_outputs.append(magnitude);
    }

    fn do_peak_spreading_and_recognition(&mut self) {
        self.do_peak_spreading();
        if self.spread_fft_outputs.num_written >= 46 {
            self.do_peak_recognition();
        }
    }

    fn do_peak_spreading(&mut self) {
        let fft_position = self.fft_outputs.position as i64;
        let mut spread_last_fft = self.fft_outputs.get(fft_position - 1).clone();

        for position in 0..=1022usize {
            spread_last_fft[position] = spread_last_fft[position]
                .max(spread_last_fft[position + 1])
                .max(spread_last_fft[position + 2]);
        }

        let spread_position = self.spread_fft_outputs.position as i64;
        for former_fft_offset in &[-1i64, -3, -6] {
            let former_fft_output = self.spread_fft_outputs.get_mut(spread_position + former_fft_offset);
            for position in 0..=1024usize {
                former_fft_output[position] = former_fft_output[position].max(spread_last_fft[position]);
            }
        }

        self.spread_fft_outputs.append(spread_last_fft);
    }

    fn do_peak_recognition(&mut self) {
        let fft_position = self.fft_outputs.position as i64;
        let spread_position = self.spread_fft_outputs.position as i64;

        let fft_minus_46 = self.fft_outputs.get(fft_position - 46).clone();
        let fft_minus_49 = self.spread_fft_outputs.get(spread_position - 49).clone();

        for bin_position in 10..=1014usize {
            if fft_minus_46[bin_position] < 1.0 / 64.0 || fft_minus_46[bin_position] < fft_minus_49[bin_position - 1] {
                continue;
            }

            let max_neighbor = [-10i32, -7, -4, -3, 1, 2, 5, 8]
                .iter()
                .map(|offset| fft_minus_49[(bin_position as i32 + offset) as usize])
                .fold(f32::MIN, f32::max);

            if fft_minus_46[bin_position] <= max_neighbor {
                continue;
            }

            let other_offsets: Vec<i64> = [-53i64, -45]
                .iter()
                .copied()
                .chain((165..=200).step_by(7).map(|n| n as i64))
                .chain((214..=249).step_by(7).map(|n| n as i64))
                .collect();

            let max_neighbor_other = other_offsets
                .iter()
                .map(|offset| self.spread_fft_outputs.get(spread_position + offset)[bin_position - 1])
                .fold(f32::MIN, f32::max);

            if fft_minus_46[bin_position] <= max_neighbor_other {
                continue;
            }

            let fft_pass_number = (self.spread_fft_outputs.num_written - 46) as u32;

            let peak_magnitude = fft_minus_46[bin_position].max(1.0 / 64.0).ln() * 1477.3 + 6144.0;
            let peak_magnitude_before = fft_minus_46[bin_position - 1].max(1.0 / 64.0).ln() * 1477.3 + 6144.0;
            let peak_magnitude_after = fft_minus_46[bin_position + 1].max(1.0 / 64.0).ln() * 1477.3 + 6144.0;

            let peak_variation_1 = peak_magnitude * 2.0 - peak_magnitude_before - peak_magnitude_after;
            let peak_variation_2 = (peak_magnitude_after - peak_magnitude_before) * 32.0 / peak_variation_1;

            let corrected_bin = bin_position as f32 * 64.0 + peak_variation_2;
            let frequency_hz = corrected_bin * (SAMPLE_RATE_HZ as f32 / 2.0 / 1024.0 / 64.0);

            let frequency_band = if frequency_hz < 250.0 {
                continue;
            } else if frequency_hz < 520.0 {
                FrequencyBand::_250_520
            } else if frequency_hz < 1450.0 {
                FrequencyBand::_520_1450
            } else if frequency_hz < 3500.0 {
                FrequencyBand::_1450_3500
            } else if frequency_hz <= 5500.0 {
                FrequencyBand::_3500_5500
            } else {
                continue;
            };

            self.next_signature
                .frequency_band_to_sound_peaks
                .entry(frequency_band)
                .or_default()
                .push(FrequencyPeak::new(
                    fft_pass_number,
                    peak_magnitude as u16,
                    corrected_bin as u16,
                    SAMPLE_RATE_HZ,
                ));
        }
    }

    /// Reduce a full buffer of 16 kHz mono samples to a single signature,
    /// with no time or peak-count cutoff. Used for one-shot, file-based
    /// fingerprinting where the whole excerpt belongs in one signature.
    pub fn make_signature_from_buffer(s16_mono_16khz_buffer: &[i16]) -> DecodedSignature {
        let mut generator = SignatureGenerator::with_limits(f32::INFINITY, usize::MAX);
        generator.feed_input(s16_mono_16khz_buffer);
        generator.get_next_signature().unwrap_or(DecodedSignature {
            sample_rate_hz: SAMPLE_RATE_HZ,
            number_samples: 0,
            frequency_band_to_sound_peaks: HashMap::new(),
        })
    }

    pub fn make_signature_from_file(file_path: &str) -> Result<DecodedSignature, Box<dyn Error>> {
        // Downsample the raw PCM samples to 16 kHz mono, then keep a window
        // centered on the middle of the track to increase recognition odds.
        let raw_pcm_samples = decode::decode_to_16khz_mono(std::path::Path::new(file_path))?;

        let mut raw_pcm_samples_slice: &[i16] = &raw_pcm_samples;
        let slice_len = raw_pcm_samples_slice.len().min(12 * SAMPLE_RATE_HZ as usize);

        if slice_len < 3 * SAMPLE_RATE_HZ as usize {
            return Err(format!(
                "Audio file '{}' is too short for fingerprinting. Need at least 3 seconds of audio, but only got {:.2} seconds.",
                file_path,
                slice_len as f32 / SAMPLE_RATE_HZ as f32
            )
            .into());
        }

        if raw_pcm_samples_slice.len() > 12 * SAMPLE_RATE_HZ as usize {
            let middle = raw_pcm_samples.len() / 2;
            raw_pcm_samples_slice = &raw_pcm_samples_slice[middle - (6 * SAMPLE_RATE_HZ as usize)..middle + (6 * SAMPLE_RATE_HZ as usize)];
        }

        Ok(SignatureGenerator::make_signature_from_buffer(&raw_pcm_samples_slice[..slice_len]))
    }
}

impl Default for SignatureGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silence(seconds: f32) -> Vec<i16> {
        vec![0i16; (seconds * SAMPLE_RATE_HZ as f32) as usize]
    }

    fn tone(seconds: f32, frequency_hz: f32) -> Vec<i16> {
        let n = (seconds * SAMPLE_RATE_HZ as f32) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE_HZ as f32;
                (8000.0 * (2.0 * std::f32::consts::PI * frequency_hz * t).sin()) as i16
            })
            .collect()
    }

    #[test]
    fn silence_produces_a_signature_with_no_peaks() {
        let signature = SignatureGenerator::make_signature_from_buffer(&silence(4.0));
        assert_eq!(signature.total_peaks(), 0);
        assert!(signature.number_samples > 0);
    }

    #[test]
    fn a_pure_tone_produces_peaks_in_a_single_band() {
        let signature = SignatureGenerator::make_signature_from_buffer(&tone(4.0, 1000.0));
        assert!(signature.total_peaks() > 0);
        assert!(signature.frequency_band_to_sound_peaks.contains_key(&FrequencyBand::_520_1450));
    }

    #[test]
    fn streaming_input_at_odd_chunk_sizes_matches_feeding_in_one_shot() {
        let samples = tone(4.0, 1000.0);

        let mut streamed = SignatureGenerator::new();
        streamed.max_time_seconds = f32::INFINITY;
        streamed.max_peaks = usize::MAX;
        for chunk in samples.chunks(37) {
            streamed.feed_input(chunk);
        }
        let streamed_signature = streamed.get_next_signature().unwrap();

        let one_shot_signature = SignatureGenerator::make_signature_from_buffer(&samples);

        assert_eq!(streamed_signature.total_peaks(), one_shot_signature.total_peaks());
    }

    #[test]
    fn get_next_signature_returns_none_below_one_hop() {
        let mut generator = SignatureGenerator::new();
        generator.feed_input(&[0i16; 127]);
        assert!(generator.get_next_signature().is_none());
    }

    #[test]
    fn a_drained_signature_covers_a_whole_number_of_128_sample_hops() {
        let mut generator = SignatureGenerator::new();
        generator.feed_input(&tone(6.0, 1000.0));
        let signature = generator.get_next_signature().unwrap();
        assert_eq!(signature.number_samples % 128, 0);
        assert!(signature.number_samples > 0);
        assert!(signature.number_samples <= 6 * SAMPLE_RATE_HZ);
    }
}
