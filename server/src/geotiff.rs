use image::{GrayImage, RgbImage, RgbaImage};
use shared::models::LngLat;
use std::io::{Read, Seek};
use thiserror::Error;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::{ColorType, TiffResult};

#[derive(Debug, Error)]
pub enum GeoTiffError {
    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),
    #[error("unsupported color type {0:?}, expected 8 bit gray, RGB or RGBA")]
    UnsupportedColor(ColorType),
    #[error("invalid georeferencing: {0}")]
    InvalidGeoreference(&'static str),
    #[error("pixel data does not match a {0}x{1} image")]
    InvalidDimensions(u32, u32),
}

/// Affine pixel to world mapping in GDAL order: x origin, x resolution,
/// row rotation, y origin, column rotation, y resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub const IDENTITY: GeoTransform = GeoTransform([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    /// From a ModelTiepointTag (I, J, K, X, Y, Z) and ModelPixelScaleTag (Sx, Sy, Sz).
    pub fn from_tie_point(tie_point: &[f64], scale: &[f64]) -> Result<Self, GeoTiffError> {
        if tie_point.len() < 6 || scale.len() < 2 {
            return Err(GeoTiffError::InvalidGeoreference("short tie point or pixel scale"));
        }
        let (i, j, x, y) = (tie_point[0], tie_point[1], tie_point[3], tie_point[4]);
        let (sx, sy) = (scale[0], scale[1]);
        Self::checked([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy])
    }

    /// From a row major 4x4 ModelTransformationTag.
    pub fn from_model_transformation(matrix: &[f64]) -> Result<Self, GeoTiffError> {
        if matrix.len() < 16 {
            return Err(GeoTiffError::InvalidGeoreference("short model transformation"));
        }
        Self::checked([
            matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5],
        ])
    }

    fn checked(gt: [f64; 6]) -> Result<Self, GeoTiffError> {
        let det = gt[1] * gt[5] - gt[2] * gt[4];
        if det == 0.0 || !det.is_finite() {
            return Err(GeoTiffError::InvalidGeoreference("transform is not invertible"));
        }
        Ok(GeoTransform(gt))
    }

    /// (row, col) of the pixel containing a world position.
    pub fn index(&self, position: LngLat) -> (i64, i64) {
        let [x0, xres, row_rot, y0, col_rot, yres] = self.0;
        let det = xres * yres - row_rot * col_rot;
        let dx = position.lng() - x0;
        let dy = position.lat() - y0;
        let col = (yres * dx - row_rot * dy) / det;
        let row = (xres * dy - col_rot * dx) / det;
        (row.floor() as i64, col.floor() as i64)
    }
}

/// Decoded pixels, keeping the band layout of the source.
pub enum Raster {
    Gray(GrayImage),
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl Raster {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Raster::Gray(img) => img.dimensions(),
            Raster::Rgb(img) => img.dimensions(),
            Raster::Rgba(img) => img.dimensions(),
        }
    }
}

pub struct GeoTiff {
    pub raster: Raster,
    pub transform: GeoTransform,
}

fn f64_tag<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> TiffResult<Option<Vec<f64>>> {
    decoder.find_tag(tag)?.map(|v| v.into_f64_vec()).transpose()
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform, GeoTiffError> {
    if let Some(matrix) = f64_tag(decoder, Tag::ModelTransformationTag)? {
        return GeoTransform::from_model_transformation(&matrix);
    }
    let tie_point = f64_tag(decoder, Tag::ModelTiepointTag)?;
    let scale = f64_tag(decoder, Tag::ModelPixelScaleTag)?;
    match (tie_point, scale) {
        (Some(tie_point), Some(scale)) => GeoTransform::from_tie_point(&tie_point, &scale),
        _ => {
            log::warn!("Raster is not georeferenced, using the identity transform");
            Ok(GeoTransform::IDENTITY)
        }
    }
}

pub fn decode<R: Read + Seek>(reader: R) -> Result<GeoTiff, GeoTiffError> {
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let transform = read_transform(&mut decoder)?;

    let color = decoder.colortype()?;
    let data = match decoder.read_image()? {
        DecodingResult::U8(data) => data,
        _ => return Err(GeoTiffError::UnsupportedColor(color)),
    };

    let raster = match color {
        ColorType::Gray(8) => GrayImage::from_raw(width, height, data).map(Raster::Gray),
        ColorType::RGB(8) => RgbImage::from_raw(width, height, data).map(Raster::Rgb),
        ColorType::RGBA(8) => RgbaImage::from_raw(width, height, data).map(Raster::Rgba),
        other => return Err(GeoTiffError::UnsupportedColor(other)),
    }
    .ok_or(GeoTiffError::InvalidDimensions(width, height))?;

    Ok(GeoTiff { raster, transform })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use tiff::encoder::{colortype, TiffEncoder};

    /// RGB GeoTIFF covering the world at `360 / width` degrees per pixel.
    pub(crate) fn world_rgb_tiff(width: u32, height: u32) -> Vec<u8> {
        let sx = 360.0 / width as f64;
        let sy = 180.0 / height as f64;
        let data = vec![10u8; (width * height * 3) as usize];

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buffer).unwrap();
            let mut image = encoder.new_image::<colortype::RGB8>(width, height).unwrap();
            image
                .encoder()
                .write_tag(Tag::ModelPixelScaleTag, &[sx, sy, 0.0][..])
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::ModelTiepointTag, &[0.0, 0.0, 0.0, -180.0, 90.0, 0.0][..])
                .unwrap();
            image.write_data(&data).unwrap();
        }
        buffer.into_inner()
    }

    fn gray16_tiff() -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        TiffEncoder::new(&mut buffer)
            .unwrap()
            .write_image::<colortype::Gray16>(2, 2, &[0u16, 1, 2, 3])
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_tie_point_transform() {
        let gt = GeoTransform::from_tie_point(&[0.0, 0.0, 0.0, -180.0, 90.0, 0.0], &[1.0, 1.0, 0.0])
            .unwrap();
        assert_eq!(gt.0, [-180.0, 1.0, 0.0, 90.0, 0.0, -1.0]);
        assert_eq!(gt.index(LngLat(-180.0, 90.0)), (0, 0));
        assert_eq!(gt.index(LngLat(0.0, 0.0)), (90, 180));
        assert_eq!(gt.index(LngLat(-0.5, 0.5)), (89, 179));
    }

    #[test]
    fn test_tie_point_offset() {
        // tie point at pixel (10, 20)
        let gt = GeoTransform::from_tie_point(&[10.0, 20.0, 0.0, 0.0, 0.0, 0.0], &[0.5, 0.5, 0.0])
            .unwrap();
        assert_eq!(gt.index(LngLat(0.0, 0.0)), (20, 10));
    }

    #[test]
    fn test_model_transformation() {
        #[rustfmt::skip]
        let matrix = [
            2.0, 0.0, 0.0, 100.0,
            0.0, -2.0, 0.0, 50.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        let gt = GeoTransform::from_model_transformation(&matrix).unwrap();
        assert_eq!(gt.0, [100.0, 2.0, 0.0, 50.0, 0.0, -2.0]);
        assert_eq!(gt.index(LngLat(105.0, 45.0)), (2, 2));
    }

    #[test]
    fn test_rotated_transform_round_trip() {
        let gt = GeoTransform([10.0, 1.0, 0.5, 20.0, 0.25, -1.0]);
        let (col, row) = (7.5, 3.5);
        let x = 10.0 + col * 1.0 + row * 0.5;
        let y = 20.0 + col * 0.25 + row * -1.0;
        assert_eq!(gt.index(LngLat(x, y)), (3, 7));
    }

    #[test]
    fn test_singular_transform_is_rejected() {
        let result = GeoTransform::from_tie_point(&[0.0; 6], &[0.0, 0.0, 0.0]);
        assert!(matches!(result, Err(GeoTiffError::InvalidGeoreference(_))));
    }

    #[test]
    fn test_decode_georeferenced_rgb() {
        let geotiff = decode(Cursor::new(world_rgb_tiff(36, 18))).unwrap();
        assert_eq!(geotiff.raster.dimensions(), (36, 18));
        assert!(matches!(geotiff.raster, Raster::Rgb(_)));
        assert_eq!(geotiff.transform.0, [-180.0, 10.0, 0.0, 90.0, 0.0, -10.0]);
    }

    #[test]
    fn test_decode_without_georeference_uses_identity() {
        let mut buffer = Cursor::new(Vec::new());
        TiffEncoder::new(&mut buffer)
            .unwrap()
            .write_image::<colortype::Gray8>(3, 2, &[0u8; 6])
            .unwrap();
        let geotiff = decode(Cursor::new(buffer.into_inner())).unwrap();
        assert!(matches!(geotiff.raster, Raster::Gray(_)));
        assert_eq!(geotiff.transform, GeoTransform::IDENTITY);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode(Cursor::new(b"definitely not a tiff".to_vec()));
        assert!(matches!(result, Err(GeoTiffError::Tiff(_))));
    }

    #[test]
    fn test_decode_rejects_16_bit() {
        let result = decode(Cursor::new(gray16_tiff()));
        assert!(matches!(result, Err(GeoTiffError::UnsupportedColor(_))));
    }
}
