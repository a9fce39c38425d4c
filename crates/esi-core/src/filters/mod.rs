pub mod gaussian_blur;
pub mod normalize;

use ndarray::Array2;

use gaussian_blur::{gaussian_blur_array, BlurConfig};
use normalize::OutputNormalization;

/// Blur a finished reconstruction, then rescale it.
pub fn postprocess(
    image: &Array2<f32>,
    blur: &BlurConfig,
    normalization: &OutputNormalization,
) -> Array2<f32> {
    let mut out = gaussian_blur_array(image, blur.sigma_x, blur.sigma_y, blur.accuracy);
    normalization.apply(&mut out);
    out
}
