use std::io;
use std::io::{ BufWriter, Write };
use std::fs::File;
use std::path::Path;

use log::debug;

use crate::error::{ Error, Result };
use crate::vector::Color;

/// The flavour of PPM file written by `Canvas::save`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PpmFormat {
    /// `P6`: a text header followed by raw RGB bytes.
    Binary,

    /// `P3`: whitespace separated decimal values, at most 70 columns a line.
    Ascii,
}

impl Default for PpmFormat {
    fn default() -> PpmFormat {
        PpmFormat::Binary
    }
}

/// Converts a color channel to a byte.
///
/// The channel is clamped above at 1 and scaled to 255, then truncated.
/// Negative values saturate to 0, and NaN becomes 255 because `f64::min`
/// prefers the non-NaN operand.
pub fn channel_to_byte(c: f64) -> u8 {
    (c.min(1.0) * 255.0) as u8
}

/// A canvas for drawing pixels.
///
/// The canvas stores the color traced for every pixel, row-major with the
/// top row first. Once rendering finishes, the `Canvas` can be saved to a
/// PPM image.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    /// The pixels of the canvas, stored as a flattened vector.
    pixels: Vec<Color>,
}

impl Canvas {
    /// Creates a black canvas with specified width and height.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::zero(); width * height]
        }
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Mutable access to the flattened pixels, for renderers that fill whole
    /// rows at a time.
    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. `y` is the row of the pixel and `x`
    /// the column, both zero-indexed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sphere_tracer::vector::Color;
    /// # use sphere_tracer::canvas::Canvas;
    /// let purple = Color::new(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2).unwrap(), purple);
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = *pixel;
    }

    /// Reads a color from a location on the `Canvas`.
    ///
    /// Returns `None` for out-of-bounds locations.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// The raster as RGB bytes, three per pixel, in canvas order.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for pixel in self.pixels.iter() {
            bytes.push(channel_to_byte(pixel.x));
            bytes.push(channel_to_byte(pixel.y));
            bytes.push(channel_to_byte(pixel.z));
        }

        bytes
    }

    /// Saves the canvas to a PPM file at `path`.
    pub fn save(&self, path: &Path, format: PpmFormat) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut out = BufWriter::new(file);

        self.write_ppm(&mut out, format)
            .and_then(|_| out.flush())
            .map_err(|e| Error::io(path, e))?;

        debug!("Wrote {}x{} {:?} PPM to {}", self.width, self.height, format,
            path.display());
        Ok(())
    }

    /// Writes the canvas as a PPM image to any writer.
    pub fn write_ppm<W: Write>(&self, out: &mut W, format: PpmFormat)
        -> io::Result<()> {
        match format {
            PpmFormat::Binary => {
                write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
                out.write_all(&self.to_rgb_bytes())
            },
            PpmFormat::Ascii => self.write_ascii(out),
        }
    }

    /// Lines in the file are clamped to 70 columns. If some value would
    /// cross the 70 column mark, it is moved to the next line.
    fn write_ascii<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?; // Maximum color value

        let mut col = 0;
        for byte in self.to_rgb_bytes() {
            let s = byte.to_string();

            if col == 0 {
                write!(out, "{}", s)?;
                col = s.len();
            } else if col + 1 + s.len() > 70 {
                write!(out, "\n{}", s)?;
                col = s.len();
            } else {
                write!(out, " {}", s)?;
                col += 1 + s.len();
            }
        }

        // Terminate the PPM file with a newline
        writeln!(out)
    }
}

#[test]
fn new_canvas_is_black() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.pixels().len(), 200);
    assert!(c.pixels().iter().all(|p| *p == Color::zero()));
}

#[test]
fn out_of_bounds_pixels() {
    let mut c = Canvas::new(4, 4);
    c.write_pixel(4, 0, &Color::uniform(1.0));

    assert_eq!(c.read_pixel(4, 0), None);
    assert!(c.pixels().iter().all(|p| *p == Color::zero()));
}

#[test]
fn channel_conversion() {
    assert_eq!(channel_to_byte(0.0), 0);
    assert_eq!(channel_to_byte(0.5), 127);
    assert_eq!(channel_to_byte(1.0), 255);
    assert_eq!(channel_to_byte(2.0), 255);
    assert_eq!(channel_to_byte(-0.3), 0);
    assert_eq!(channel_to_byte(f64::NAN), 255);
}

#[test]
fn binary_ppm_layout() {
    let mut c = Canvas::new(2, 1);
    c.write_pixel(0, 0, &Color::new(1.0, 0.0, 0.5));
    c.write_pixel(1, 0, &Color::new(0.2, 3.0, 0.0));

    let mut out = Vec::new();
    c.write_ppm(&mut out, PpmFormat::Binary).unwrap();

    let mut expected = b"P6\n2 1\n255\n".to_vec();
    expected.extend_from_slice(&[255, 0, 127, 51, 255, 0]);
    assert_eq!(out, expected);
}

#[test]
fn rows_are_written_top_first() {
    let mut c = Canvas::new(1, 2);
    c.write_pixel(0, 1, &Color::uniform(1.0));

    assert_eq!(c.to_rgb_bytes(), vec![0, 0, 0, 255, 255, 255]);
}

#[test]
fn ascii_ppm_header_and_wrapping() {
    let mut c = Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            c.write_pixel(x, y, &Color::new(1.0, 0.8, 0.4));
        }
    }

    let mut out = Vec::new();
    c.write_ppm(&mut out, PpmFormat::Ascii).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "P3");
    assert_eq!(lines[1], "10 2");
    assert_eq!(lines[2], "255");
    assert!(lines[3..].iter().all(|l| l.len() <= 70));
    assert!(text.ends_with('\n'));

    let values: Vec<&str> = lines[3..].iter()
        .flat_map(|l| l.split_whitespace())
        .collect();
    assert_eq!(values.len(), 60);
    assert_eq!(&values[..3], &["255", "204", "102"]);
}

#[test]
fn save_reports_path_on_failure() {
    let c = Canvas::new(1, 1);
    let path = Path::new("/nonexistent-dir/for/sure/out.ppm");

    match c.save(path, PpmFormat::Binary) {
        Err(Error::Io { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}

#[test]
fn save_binary_to_disk() {
    let mut c = Canvas::new(3, 2);
    c.write_pixel(2, 1, &Color::new(0.0, 1.0, 0.0));

    let path = std::env::temp_dir()
        .join(format!("sphere-tracer-canvas-{}.ppm", std::process::id()));
    c.save(&path, PpmFormat::Binary).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(bytes.starts_with(b"P6\n3 2\n255\n"));
    assert_eq!(bytes.len(), 11 + 18);
    assert_eq!(&bytes[bytes.len() - 3..], &[0, 255, 0]);
}
