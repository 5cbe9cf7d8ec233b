//! Property-based invariant tests for the mask codec and overlay geometry.
//!
//! 1. decode(encode(m)) == m bit-for-bit.
//! 2. Any run list whose sum differs from width*height is rejected.
//! 3. Re-classifying an exported raster yields the same mask.
//! 4. fit_within never exceeds its caps, never upscales, keeps aspect within a pixel.
//! 5. Resampled coordinates always land inside the source grid.
//! 6. Tint touches exactly the selected pixels.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use mask_overlay::mask::{
    self, BitmapMask, MaskClassifier, MaskFormatError, STROKE_COLOR, encode_runs,
};
use mask_overlay::overlay::{PixelBuffer, composite_pixels, resize_pixels};
use mask_overlay::resample::{Resampler, fit_within};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn mask_strategy() -> impl Strategy<Value = BitmapMask> {
    (1u32..=40, 1u32..=40)
        .prop_flat_map(|(w, h)| {
            (
                Just(w),
                Just(h),
                prop::collection::vec(any::<bool>(), (w * h) as usize),
            )
        })
        .prop_map(|(w, h, bits)| BitmapMask::from_bits(w, h, bits).expect("strategy builds valid masks"))
}

fn wire(width: u32, height: u32, runs: &[u64]) -> String {
    let joined: Vec<String> = runs.iter().map(u64::to_string).collect();
    format!("MASK:{}x{}:{}", width, height, joined.join(","))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn encode_decode_round_trip(m in mask_strategy()) {
        let encoded = mask::encode(&m);
        let decoded = mask::decode(&encoded).expect("encoder output must decode");
        prop_assert_eq!(decoded, m);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Run-sum invariant
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn encoded_runs_sum_to_pixel_count(m in mask_strategy()) {
        let sum: u64 = encode_runs(&m).iter().sum();
        prop_assert_eq!(sum, m.pixel_count());
    }

    #[test]
    fn inflated_run_list_is_rejected(m in mask_strategy(), extra in 1u64..1000) {
        let mut runs = encode_runs(&m);
        if let Some(last) = runs.last_mut() {
            *last += extra;
        }

        let result = mask::decode(&wire(m.width(), m.height(), &runs));
        let is_sum_mismatch = matches!(result, Err(MaskFormatError::RunSumMismatch { .. }));
        prop_assert!(is_sum_mismatch, "got {:?}", result);
    }

    #[test]
    fn truncated_run_list_is_rejected(m in mask_strategy()) {
        let mut runs = encode_runs(&m);
        runs.pop();
        prop_assume!(!runs.is_empty());

        let result = mask::decode(&wire(m.width(), m.height(), &runs));
        prop_assert!(result.is_err(), "decoder must not pad a short run list");
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Idempotence of classification
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn mask_image_reclassifies_identically(m in mask_strategy()) {
        let decoded = mask::decode(&mask::encode(&m)).expect("round trip");
        let raster = decoded.to_mask_image();
        let again = BitmapMask::from_rgba_image(&raster, MaskClassifier::MaskImage).expect("classify");
        prop_assert_eq!(&again, &m);

        let alpha = decoded.to_alpha_mask();
        let from_alpha = BitmapMask::from_rgba_image(&alpha, MaskClassifier::MaskImage).expect("classify");
        prop_assert_eq!(from_alpha, m);
    }

    #[test]
    fn stroke_layer_reclassifies_identically(m in mask_strategy()) {
        let layer = RgbaImage::from_fn(m.width(), m.height(), |x, y| {
            if m.get(x, y) == Some(true) { Rgba(STROKE_COLOR) } else { Rgba([0, 0, 0, 0]) }
        });
        let again = BitmapMask::from_rgba_image(&layer, MaskClassifier::PaintStroke).expect("classify");
        prop_assert_eq!(again, m);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Aspect-ratio preservation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fit_within_respects_caps_and_aspect(
        w in 1u32..=5000,
        h in 1u32..=5000,
        max_w in 1u32..=2000,
        max_h in 1u32..=2000,
    ) {
        let (dw, dh) = fit_within(w, h, max_w, max_h).expect("positive inputs always fit");

        prop_assert!(dw >= 1 && dh >= 1);
        prop_assert!(dw <= max_w && dh <= max_h, "{}x{} exceeds box {}x{}", dw, dh, max_w, max_h);
        prop_assert!(dw <= w && dh <= h, "{}x{} upscales {}x{}", dw, dh, w, h);

        let width_err = (dw as f64 - dh as f64 * w as f64 / h as f64).abs();
        let height_err = (dh as f64 - dw as f64 * h as f64 / w as f64).abs();
        prop_assert!(
            width_err <= 1.0 || height_err <= 1.0,
            "{}x{} -> {}x{} drifts from aspect", w, h, dw, dh
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Resampler bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn resampled_coordinates_stay_in_source(
        dw in 1u32..=300,
        dh in 1u32..=300,
        sw in 1u32..=300,
        sh in 1u32..=300,
    ) {
        let resampler = Resampler::new(dw, dh, sw, sh);
        prop_assert_eq!(resampler.columns().len(), dw as usize);
        prop_assert!(resampler.columns().iter().all(|&x| x < sw));
        for y in 0..dh {
            prop_assert!(resampler.row(y) < sh);
        }
        let (mx, my) = resampler.map(dw - 1, dh - 1);
        prop_assert!(mx < sw && my < sh);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Tint locality
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tint_changes_exactly_selected_pixels(
        m in mask_strategy(),
        ow in 1u32..=60,
        oh in 1u32..=60,
        seed in any::<u8>(),
    ) {
        // 红色通道保持在 155 以下，着色必然改变像素
        let original = PixelBuffer::from_fn(ow, oh, |x, y| {
            [((x + y) as u8).wrapping_add(seed) % 156, 90, 140, 255]
        })
        .expect("buffer");

        let out = composite_pixels(&original, Some(&m), 40, 40, FilterType::Nearest).expect("composite");
        let (dw, dh) = out.dimensions();
        let base = resize_pixels(&original, dw, dh, FilterType::Nearest).expect("resize");
        let resampler = Resampler::new(dw, dh, m.width(), m.height());

        for y in 0..dh {
            for x in 0..dw {
                let (mx, my) = resampler.map(x, y);
                let selected = m.get(mx, my) == Some(true);
                let changed = out.pixel(x, y) != base.pixel(x, y);
                prop_assert_eq!(changed, selected, "pixel ({}, {})", x, y);
            }
        }
    }
}
