//! Audio level in dBov, as carried by the client-to-mixer audio level
//! header extension (RFC 6464).

/// Level reported for silence and anything quieter.
pub const MIN_AUDIO_LEVEL: i8 = -127;
/// Level at or above the overload point.
pub const MAX_AUDIO_LEVEL: i8 = 0;

/// Loudness of `samples[offset..length]` relative to `overload`, in whole
/// decibels within `[-127, 0]`.
///
/// Samples are normalized by `overload` (the value that maps to 0 dBov),
/// the sum of squares is divided by `length` and the RMS converted with
/// `20 * log10(rms)`, rounding halves away from zero. `length` is an end
/// index, not a count, and is clamped to the slice. A zero RMS or zero
/// `overload` yields [`MIN_AUDIO_LEVEL`].
pub fn audio_level<S>(samples: &[S], offset: usize, length: usize, overload: u32) -> i8
where
    S: Copy + Into<f64>,
{
    let end = length.min(samples.len());
    if overload == 0 || end == 0 {
        return MIN_AUDIO_LEVEL;
    }

    let overload = overload as f64;
    let sum: f64 = samples
        .get(offset..end)
        .unwrap_or(&[])
        .iter()
        .map(|&s| {
            let s = s.into() / overload;
            s * s
        })
        .sum();
    let rms = (sum / end as f64).sqrt();

    if rms > 0.0 {
        let db = 20.0 * rms.log10();
        db.clamp(MIN_AUDIO_LEVEL as f64, MAX_AUDIO_LEVEL as f64).round() as i8
    } else {
        MIN_AUDIO_LEVEL
    }
}
