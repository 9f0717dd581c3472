//! Pagination – splits a captured bitmap into page-sized bands.
//!
//! The bitmap is scaled to the page width, so one page covers
//! `round(page_height × bitmap_width / page_width)` pixel rows. Bands are
//! taken top to bottom; band `i` is the slice drawn at a vertical offset of
//! `-i × band` on its page, and the last band is padded with white.
//!
//! All arithmetic is done in whole pixels so the page count is exact:
//! a bitmap of exactly `k` bands yields `k` pages, one more row yields `k + 1`.

use image::{imageops, Rgb, RgbImage};
use log::debug;

/// One page worth of the captured bitmap.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub index: usize,
    /// Vertical offset of the full bitmap on this page, in pixels (zero or
    /// negative).
    pub offset_px: i64,
    /// The same offset in millimetres at page scale.
    pub offset_mm: f64,
    /// The band itself, exactly one page tall.
    pub image: RgbImage,
}

/// Pixel rows that fit on one page for a bitmap `width_px` wide.
pub fn band_height_px(width_px: u32, page_width_mm: f64, page_height_mm: f64) -> u32 {
    let band = (page_height_mm * f64::from(width_px) / page_width_mm).round();
    (band as u32).max(1)
}

/// Number of pages `paginate` produces for a bitmap of the given size.
pub fn page_count(width_px: u32, height_px: u32, page_width_mm: f64, page_height_mm: f64) -> usize {
    let band = band_height_px(width_px, page_width_mm, page_height_mm);
    (height_px.div_ceil(band) as usize).max(1)
}

/// Split `bitmap` into page bands. A bitmap with no columns yields no pages.
pub fn paginate(bitmap: &RgbImage, page_width_mm: f64, page_height_mm: f64) -> Vec<PageImage> {
    let (width, height) = bitmap.dimensions();
    if width == 0 {
        return Vec::new();
    }
    let band = band_height_px(width, page_width_mm, page_height_mm);
    let mm_per_px = page_width_mm / f64::from(width);

    let mut pages = Vec::new();
    let mut consumed: u32 = 0;
    let mut remaining = i64::from(height);
    loop {
        let mut page = RgbImage::from_pixel(width, band, Rgb([255, 255, 255]));
        let rows = band.min(height.saturating_sub(consumed));
        if rows > 0 {
            let slice = imageops::crop_imm(bitmap, 0, consumed, width, rows).to_image();
            imageops::replace(&mut page, &slice, 0, 0);
        }

        let offset_px = -i64::from(consumed);
        pages.push(PageImage {
            index: pages.len(),
            offset_px,
            offset_mm: offset_px as f64 * mm_per_px,
            image: page,
        });

        consumed += band;
        remaining -= i64::from(band);
        if remaining <= 0 {
            break;
        }
    }

    debug!(
        "paginated {width}x{height} px into {} page(s) of {band} rows",
        pages.len()
    );
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A4: (f64, f64) = (210.0, 297.0);

    fn striped(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| Rgb([(y % 251) as u8, 0, 0]))
    }

    #[test]
    fn band_matches_page_aspect() {
        assert_eq!(band_height_px(210, A4.0, A4.1), 297);
        assert_eq!(band_height_px(1190, A4.0, A4.1), 1683);
        // Letter: 279 × 1000 / 216 = 1291.67
        assert_eq!(band_height_px(1000, 216.0, 279.0), 1292);
    }

    #[test]
    fn short_bitmap_is_one_padded_page() {
        let pages = paginate(&striped(210, 100), A4.0, A4.1);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].offset_px, 0);
        assert_eq!(pages[0].image.dimensions(), (210, 297));
        assert_eq!(pages[0].image.get_pixel(0, 99).0, [99, 0, 0]);
        assert_eq!(pages[0].image.get_pixel(0, 100).0, [255, 255, 255]);
    }

    #[test]
    fn exact_multiple_yields_exact_pages() {
        for k in 1..=4u32 {
            let pages = paginate(&striped(210, 297 * k), A4.0, A4.1);
            assert_eq!(pages.len(), k as usize);
            let pages = paginate(&striped(210, 297 * k + 1), A4.0, A4.1);
            assert_eq!(pages.len(), k as usize + 1);
        }
    }

    #[test]
    fn offsets_step_by_one_band() {
        let pages = paginate(&striped(210, 700), A4.0, A4.1);
        let offsets: Vec<i64> = pages.iter().map(|p| p.offset_px).collect();
        assert_eq!(offsets, vec![0, -297, -594]);
        assert!((pages[1].offset_mm + 297.0).abs() < 1e-9);
        // Band 2 starts at source row 297.
        assert_eq!(pages[1].image.get_pixel(5, 0).0, [(297 % 251) as u8, 0, 0]);
        // Last band: 700 - 594 = 106 real rows, rest white.
        assert_eq!(pages[2].image.get_pixel(5, 105).0, [(699 % 251) as u8, 0, 0]);
        assert_eq!(pages[2].image.get_pixel(5, 106).0, [255, 255, 255]);
    }

    #[test]
    fn zero_width_yields_nothing() {
        assert!(paginate(&RgbImage::new(0, 10), A4.0, A4.1).is_empty());
    }

    proptest! {
        #[test]
        fn page_count_is_ceiling_of_bands(width in 1u32..400, height in 0u32..3000) {
            let bitmap = RgbImage::new(width, height);
            let pages = paginate(&bitmap, A4.0, A4.1);
            prop_assert_eq!(pages.len(), page_count(width, height, A4.0, A4.1));
            let band = band_height_px(width, A4.0, A4.1);
            for (i, page) in pages.iter().enumerate() {
                prop_assert_eq!(page.index, i);
                prop_assert_eq!(page.offset_px, -(i as i64) * i64::from(band));
                prop_assert_eq!(page.image.dimensions(), (width, band));
            }
        }
    }
}
