use anyhow::Result;
use image::{GenericImage, Luma, Rgb, Rgba};
use imageproc::drawing::draw_line_segment_mut;
use png::{BitDepth, ColorType, Encoder};
use shared::models::LngLat;

use crate::geotiff::{GeoTiff, GeoTransform, Raster};

const LINE_WIDTH: i32 = 2;
const YELLOW: [u8; 3] = [255, 255, 0];
// Luma of yellow for single band rasters
const YELLOW_GRAY: u8 = 226;

type Point = (f64, f64);

/// Pixel (x, y) of each position on the raster grid.
pub fn pixel_path(transform: &GeoTransform, positions: &[LngLat]) -> Vec<Point> {
    positions
        .iter()
        .map(|p| {
            let (row, col) = transform.index(*p);
            (col as f64, row as f64)
        })
        .collect()
}

/// Liang-Barsky clipping of a segment to `[min.0, max.0] x [min.1, max.1]`.
fn clip_segment(from: Point, to: Point, min: Point, max: Point) -> Option<(Point, Point)> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-dx, from.0 - min.0),
        (dx, max.0 - from.0),
        (-dy, from.1 - min.1),
        (dy, max.1 - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    Some((
        (from.0 + t0 * dx, from.1 + t0 * dy),
        (from.0 + t1 * dx, from.1 + t1 * dy),
    ))
}

/// Draw a `width` pixel polyline, clipped to the canvas.
fn draw_polyline<I: GenericImage>(canvas: &mut I, points: &[Point], color: I::Pixel, width: i32) {
    let (w, h) = canvas.dimensions();
    // widened by the line width so the offset strokes reach the border
    let margin = width as f64;
    let min = (-margin, -margin);
    let max = (w as f64 + margin, h as f64 + margin);

    for segment in points.windows(2) {
        let Some(((x0, y0), (x1, y1))) = clip_segment(segment[0], segment[1], min, max) else {
            continue;
        };
        let (x0, y0, x1, y1) = (x0 as f32, y0 as f32, x1 as f32, y1 as f32);
        for dx in 0..width {
            for dy in 0..width {
                let (dx, dy) = (dx as f32, dy as f32);
                draw_line_segment_mut(canvas, (x0 + dx, y0 + dy), (x1 + dx, y1 + dy), color);
            }
        }
    }
}

impl Raster {
    pub fn draw_trajectory(&mut self, points: &[Point]) {
        match self {
            Raster::Gray(img) => draw_polyline(img, points, Luma([YELLOW_GRAY]), LINE_WIDTH),
            Raster::Rgb(img) => draw_polyline(img, points, Rgb(YELLOW), LINE_WIDTH),
            Raster::Rgba(img) => {
                let [r, g, b] = YELLOW;
                draw_polyline(img, points, Rgba([r, g, b, 255]), LINE_WIDTH)
            }
        }
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let (width, height) = self.dimensions();
        match self {
            Raster::Gray(img) => encode_png(img.as_raw(), width, height, ColorType::Grayscale),
            Raster::Rgb(img) => encode_png(img.as_raw(), width, height, ColorType::Rgb),
            Raster::Rgba(img) => encode_png(img.as_raw(), width, height, ColorType::Rgba),
        }
    }
}

/// Draw the flight path over the raster and encode the result as PNG.
pub fn render(geotiff: GeoTiff, positions: &[LngLat]) -> Result<Vec<u8>> {
    let GeoTiff {
        mut raster,
        transform,
    } = geotiff;
    let points = pixel_path(&transform, positions);
    raster.draw_trajectory(&points);
    raster.to_png()
}

fn encode_png(data: &[u8], width: u32, height: u32, color: ColorType) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut encoder = Encoder::new(&mut buffer, width, height);
        encoder.set_color(color);
        encoder.set_depth(BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(data)?;
    }

    Ok(buffer)
}
