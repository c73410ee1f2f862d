use image::{DynamicImage, GrayImage};

use crate::BoundingBox;

/// Crops the token's box out of the image as 8-bit luma, clamped to the image bounds.
pub(crate) fn part_image(image: &DynamicImage, b_box: &BoundingBox) -> GrayImage {
    let x = b_box.left.min(image.width());
    let y = b_box.top.min(image.height());
    let width = b_box.width.min(image.width() - x);
    let height = b_box.height.min(image.height() - y);
    log::trace!("Slicing subimage to ({x}, {y}, {width}, {height})");
    image.crop_imm(x, y, width, height).to_luma8()
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    #[test]
    fn patch_is_clamped_to_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 40, Rgb([10, 20, 30])));
        let patch = part_image(&image, &BoundingBox::new(40, 30, 30, 30));
        assert_eq!(patch.dimensions(), (10, 10));

        let outside = part_image(&image, &BoundingBox::new(60, 60, 5, 5));
        assert_eq!(outside.dimensions(), (0, 0));
    }
}
