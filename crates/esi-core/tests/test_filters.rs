use approx::assert_abs_diff_eq;
use esi_core::filters::gaussian_blur::{
    gaussian_blur, gaussian_blur_array, make_gaussian_kernel, BlurConfig,
};
use esi_core::filters::normalize::{add_into, normalize_range, normalize_unit, OutputNormalization};
use esi_core::filters::postprocess;
use esi_core::frame::Frame;
use ndarray::Array2;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn checkerboard(h: usize, w: usize) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(r, c)| ((r + c) % 2) as f32)
}

// ---------------------------------------------------------------------------
// gaussian_blur
// ---------------------------------------------------------------------------

#[test]
fn test_kernel_radius_follows_accuracy() {
    // ceil(0.8 * sqrt(-2 ln 0.01)) + 1 = 4
    let kernel = make_gaussian_kernel(0.8, 0.01);
    assert_eq!(kernel.len(), 9);
    assert_abs_diff_eq!(kernel.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
    assert!(kernel[4] > kernel[3] && kernel[3] > kernel[2]);
    assert_abs_diff_eq!(kernel[0], kernel[8]);
}

#[test]
fn test_zero_sigma_is_identity() {
    assert_eq!(make_gaussian_kernel(0.0, 0.01), vec![1.0]);
    let data = checkerboard(6, 6);
    assert_eq!(gaussian_blur_array(&data, 0.0, 0.0, 0.01), data);
}

#[test]
fn test_blur_preserves_constant_image() {
    let frame = Frame::new(Array2::from_elem((12, 9), 0.7f32), 32);
    let blurred = gaussian_blur(&frame, &BlurConfig::default());
    for v in blurred.data.iter() {
        assert_abs_diff_eq!(*v, 0.7, epsilon = 1e-5);
    }
}

#[test]
fn test_blur_suppresses_checkerboard() {
    let data = checkerboard(16, 16);
    let blurred = gaussian_blur_array(&data, 0.8, 0.8, 0.01);
    let spread = |a: &Array2<f32>| {
        let lo = a.iter().cloned().fold(f32::MAX, f32::min);
        let hi = a.iter().cloned().fold(f32::MIN, f32::max);
        hi - lo
    };
    assert!(spread(&blurred) < 0.5 * spread(&data));
}

#[test]
fn test_large_image_takes_parallel_path() {
    // 300 x 300 exceeds the parallel pixel threshold
    let data = Array2::from_shape_fn((300, 300), |(r, c)| ((r * 7 + c * 3) % 17) as f32);
    let blurred = gaussian_blur_array(&data, 0.8, 0.8, 0.01);
    let small = gaussian_blur_array(&data.slice(ndarray::s![..20, ..20]).to_owned(), 0.8, 0.8, 0.01);
    // interior pixels far from the crop edge agree
    assert_abs_diff_eq!(blurred[[8, 8]], small[[8, 8]], epsilon = 1e-5);
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

#[test]
fn test_normalize_unit_stretches_range() {
    let mut data = Array2::from_shape_vec((1, 3), vec![-2.0f32, 0.0, 6.0]).unwrap();
    normalize_unit(&mut data);
    assert_eq!(data.as_slice().unwrap(), &[0.0, 0.25, 1.0]);
}

#[test]
fn test_normalize_custom_range() {
    let mut data = Array2::from_shape_vec((2, 1), vec![1.0f32, 3.0]).unwrap();
    normalize_range(&mut data, 10.0, 20.0);
    assert_eq!(data.as_slice().unwrap(), &[10.0, 20.0]);
}

#[test]
fn test_normalize_constant_image_maps_to_low() {
    let mut data = Array2::from_elem((3, 3), 4.2f32);
    normalize_range(&mut data, 0.5, 1.0);
    assert!(data.iter().all(|&v| v == 0.5));
}

#[test]
fn test_output_normalization_none_keeps_values() {
    let mut data = Array2::from_elem((2, 2), -3.0f32);
    OutputNormalization::None.apply(&mut data);
    assert!(data.iter().all(|&v| v == -3.0));
}

#[test]
fn test_add_into_accumulates() {
    let mut sum = Array2::<f32>::zeros((2, 2));
    let image = Array2::from_elem((2, 2), 1.5f32);
    add_into(&mut sum, &image).unwrap();
    add_into(&mut sum, &image).unwrap();
    assert!(sum.iter().all(|&v| v == 3.0));
    assert!(add_into(&mut sum, &Array2::zeros((3, 2))).is_err());
}

#[test]
fn test_postprocess_blurs_then_normalizes() {
    let data = checkerboard(10, 10);
    let out = postprocess(&data, &BlurConfig::default(), &OutputNormalization::Unit);
    let lo = out.iter().cloned().fold(f32::MAX, f32::min);
    let hi = out.iter().cloned().fold(f32::MIN, f32::max);
    assert_eq!(lo, 0.0);
    assert_abs_diff_eq!(hi, 1.0, epsilon = 1e-6);
}
