use super::font;
use crate::constants::{
    CORNER_RADIUS_FRACTION, MAX_TEXTURE_SIDE, MIN_CORNER_RADIUS_PX, PLACEHOLDER_GRADIENT_END,
    PLACEHOLDER_GRADIENT_START,
};
use crate::item::GalleryItem;
use crate::{GalleryError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

/// 2D compositing capability used to turn decoded images into card textures.
pub trait Raster {
    /// Cover-fit `image` into `size` and clip it to a rounded rectangle.
    fn composite_rounded(
        &self,
        image: &DynamicImage,
        size: (u32, u32),
        corner_radius: f32,
    ) -> Result<RgbaImage>;

    /// Gradient card labelled with the item's id and title.
    fn placeholder(&self, item: &GalleryItem, size: (u32, u32)) -> Result<RgbaImage>;
}

/// Corner radius in pixels for a texture `width` wide.
pub fn corner_radius(width: u32) -> f32 {
    (width as f32 * CORNER_RADIUS_FRACTION).max(MIN_CORNER_RADIUS_PX as f32)
}

/// Antialiased coverage of pixel `(x, y)` inside a `w`x`h` rounded rectangle.
pub fn rounded_coverage(x: u32, y: u32, w: u32, h: u32, radius: f32) -> f32 {
    let r = radius.clamp(0.0, w.min(h) as f32 * 0.5);
    let px = x as f32 + 0.5;
    let py = y as f32 + 0.5;
    let cx = px.clamp(r, w as f32 - r);
    let cy = py.clamp(r, h as f32 - r);
    let d = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
    (r - d + 0.5).clamp(0.0, 1.0)
}

fn apply_rounded_mask(img: &mut RgbaImage, radius: f32) {
    let (w, h) = img.dimensions();
    for (x, y, p) in img.enumerate_pixels_mut() {
        let cov = rounded_coverage(x, y, w, h, radius);
        if cov < 1.0 {
            p[3] = (p[3] as f32 * cov).round() as u8;
        }
    }
}

fn check_target(size: (u32, u32)) -> Result<()> {
    let (w, h) = size;
    if w == 0 || h == 0 || w > MAX_TEXTURE_SIDE || h > MAX_TEXTURE_SIDE {
        return Err(GalleryError::CompositeRasterUnavailable {
            width: w,
            height: h,
        });
    }
    Ok(())
}

/// CPU raster on top of the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareRaster;

impl Raster for SoftwareRaster {
    fn composite_rounded(
        &self,
        image: &DynamicImage,
        size: (u32, u32),
        corner_radius: f32,
    ) -> Result<RgbaImage> {
        check_target(size)?;
        let (w, h) = size;
        let mut out = image.resize_to_fill(w, h, FilterType::Triangle).to_rgba8();
        apply_rounded_mask(&mut out, corner_radius);
        Ok(out)
    }

    fn placeholder(&self, item: &GalleryItem, size: (u32, u32)) -> Result<RgbaImage> {
        check_target(size)?;
        let (w, h) = size;
        let [r0, g0, b0] = PLACEHOLDER_GRADIENT_START;
        let [r1, g1, b1] = PLACEHOLDER_GRADIENT_END;
        let lerp = |a: u8, b: u8, t: f32| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        let mut img = RgbaImage::from_fn(w, h, |x, y| {
            // diagonal: top-left -> bottom-right
            let t = ((x as f32 / w as f32) + (y as f32 / h as f32)) * 0.5;
            Rgba([lerp(r0, r1, t), lerp(g0, g1, t), lerp(b0, b1, t), 255])
        });

        let margin = (w / 10).max(2);
        let usable = w.saturating_sub(2 * margin);
        let white = Rgba([255, 255, 255, 255]);
        let dim = Rgba([255, 255, 255, 190]);
        let centered =
            |text: &str, scale: u32| (w as i32 - font::text_width(text, scale) as i32) / 2;

        let id = format!("#{}", item.id);
        let id_scale = font::fit_scale(&id, usable, 4);
        let id_y = (h as f32 * 0.32) as i32;
        font::draw_text(&mut img, &id, centered(&id, id_scale), id_y, id_scale, white);

        let title_scale = font::fit_scale(&item.title, usable, 2);
        let title = font::ellipsize(&item.title, usable, title_scale);
        let title_y = id_y + (font::GLYPH_H * id_scale) as i32 + (h / 16) as i32;
        let title_x = centered(&title, title_scale);
        font::draw_text(&mut img, &title, title_x, title_y, title_scale, white);

        let caption = "IMAGE UNAVAILABLE";
        let caption_scale = font::fit_scale(caption, usable, 1);
        let caption_y = h as i32 - margin as i32 - (font::GLYPH_H * caption_scale) as i32;
        let caption_x = centered(caption, caption_scale);
        font::draw_text(&mut img, caption, caption_x, caption_y, caption_scale, dim);

        apply_rounded_mask(&mut img, corner_radius(w));
        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_radius_has_floor() {
        assert_eq!(corner_radius(32), 2.0);
        assert!((corner_radius(256) - 10.24).abs() < 1e-4);
    }

    #[test]
    fn corners_are_transparent_and_center_opaque() {
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([9, 9, 9, 255])));
        let out = SoftwareRaster
            .composite_rounded(&src, (64, 90), 10.0)
            .unwrap();
        assert_eq!(out.dimensions(), (64, 90));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(63, 89)[3], 0);
        assert_eq!(out.get_pixel(32, 45)[3], 255);
    }

    #[test]
    fn oversized_target_is_unavailable() {
        let item = GalleryItem::new(1, "x", "/x.jpg");
        let err = SoftwareRaster.placeholder(&item, (5000, 10)).unwrap_err();
        assert!(matches!(err, GalleryError::CompositeRasterUnavailable { .. }));
        assert!(SoftwareRaster.placeholder(&item, (0, 10)).is_err());
    }

    #[test]
    fn placeholder_is_gradient_with_label() {
        let item = GalleryItem::new(12, "Project 12", "/12.jpg");
        let img = SoftwareRaster.placeholder(&item, (128, 179)).unwrap();
        let top_left = img.get_pixel(8, 8);
        let bottom_right = img.get_pixel(119, 170);
        assert_ne!(top_left[0], bottom_right[0]);
        // some label pixels are pure white
        assert!(img.pixels().any(|p| p[0] == 255 && p[1] == 255 && p[2] == 255));
    }
}
