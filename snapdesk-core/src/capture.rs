//! Multi-monitor capture and composition.
//!
//! All attached displays are captured at a single point in time and stitched
//! side-by-side into one RGBA canvas: total width is the sum of every display's
//! width, height is the tallest display's height. Shorter displays leave a
//! fully transparent strip below them - no cropping, no letterboxing.

/// Conventional attachment name for an encoded screenshot.
pub const ATTACHMENT_NAME: &str = "screenshot.png";

/// One physical (or virtual) monitor at capture time.
///
/// Origin and size are in pixel units, in whatever order the OS enumerates
/// monitors - not guaranteed left-to-right. Never cached across invocations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Display {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A [`Display`] plus its captured pixels.
///
/// Invariant: the pixel buffer's dimensions equal the display's dimensions.
/// [`composite`] rejects frames that violate this.
pub struct DisplayFrame {
    pub display: Display,
    pub pixels: image::RgbaImage,
}

impl DisplayFrame {
    fn dimensions_agree(&self) -> bool {
        self.pixels.width() == self.display.width && self.pixels.height() == self.display.height
    }
}

/// Monitor counts are tiny, keep the frame list inline.
pub type Frames = smallvec::SmallVec<[DisplayFrame; 4]>;

/// Seam to the OS display/capture API, so the compositor itself stays pure.
pub trait ScreenSource {
    /// Capture every attached display, fresh, in OS enumeration order.
    fn capture_all(&self) -> Result<Frames, CaptureError>;
}

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// Zero displays attached (or a headless session). Deliberately an error,
    /// never a zero-sized image.
    #[error("no displays attached")]
    NoDisplays,
    /// A frame's pixel buffer disagrees with its display dimensions.
    #[error("captured frame does not match its display dimensions")]
    MismatchedFrame,
    #[error("screen capture backend: {0}")]
    Backend(#[from] xcap::XCapError),
    #[error(transparent)]
    Encode(#[from] EncodingError),
}

/// Canvas-to-PNG encoding failed. Fatal to the invocation only.
#[derive(thiserror::Error, Debug)]
#[error("png encoding: {0}")]
pub struct EncodingError(#[from] image::ImageError);

/// Stitch captured frames into one canvas.
///
/// Each frame is copied (source-copy, not a blend) at a horizontal offset
/// equal to the cumulative width of the frames before it, vertical offset 0.
/// The canvas is zero-initialized, so unwritten regions come out transparent.
///
/// # Errors
/// [`CaptureError::NoDisplays`] for an empty frame set,
/// [`CaptureError::MismatchedFrame`] if any frame's pixels disagree with its
/// display dimensions.
pub fn composite(frames: &[DisplayFrame]) -> Result<image::RgbaImage, CaptureError> {
    if frames.is_empty() {
        return Err(CaptureError::NoDisplays);
    }
    if frames.iter().any(|frame| !frame.dimensions_agree()) {
        return Err(CaptureError::MismatchedFrame);
    }

    let width: u32 = frames.iter().map(|frame| frame.display.width).sum();
    // Unwrap OK - non-empty checked above.
    let height = frames
        .iter()
        .map(|frame| frame.display.height)
        .max()
        .unwrap();

    // `new` zero-fills. Nothing ever writes the strip below a short display,
    // so those pixels stay (0,0,0,0).
    let mut canvas = image::RgbaImage::new(width, height);
    let mut x_offset = 0u32;
    for frame in frames {
        // `replace` overwrites alpha too - a raster copy, not an `overlay` blend.
        image::imageops::replace(&mut canvas, &frame.pixels, i64::from(x_offset), 0);
        x_offset += frame.display.width;
    }
    Ok(canvas)
}

/// Losslessly encode a canvas to PNG bytes. The buffer is the caller's to
/// transport or drop.
///
/// # Errors
/// [`EncodingError`] if the underlying encoder fails.
pub fn encode_png(canvas: &image::RgbaImage) -> Result<Vec<u8>, EncodingError> {
    use image::ImageEncoder;
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(std::io::Cursor::new(&mut bytes)).write_image(
        canvas.as_raw(),
        canvas.width(),
        canvas.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Capture, stitch, and encode every display of `source` in one shot.
///
/// No retries - a denied capture surfaces as a single failure and the caller
/// decides what to do with it.
///
/// # Errors
/// Any [`CaptureError`] from the backend, composition, or encoding.
pub fn composite_all_displays<S: ScreenSource + ?Sized>(
    source: &S,
) -> Result<Vec<u8>, CaptureError> {
    let frames = source.capture_all()?;
    let canvas = composite(&frames)?;
    Ok(encode_png(&canvas)?)
}

/// The live OS backend, via `xcap`.
pub struct LiveScreens;

impl ScreenSource for LiveScreens {
    fn capture_all(&self) -> Result<Frames, CaptureError> {
        let monitors = xcap::Monitor::all()?;
        let mut frames = Frames::new();
        for monitor in monitors {
            let pixels = monitor.capture_image()?;
            // On hidpi setups the captured buffer is physical resolution while
            // the monitor reports logical units. The pixels are the truth.
            let display = Display {
                x: monitor.x(),
                y: monitor.y(),
                width: pixels.width(),
                height: pixels.height(),
            };
            log::debug!(
                "captured \"{}\": {}x{} at ({}, {})",
                monitor.name(),
                display.width,
                display.height,
                display.x,
                display.y
            );
            frames.push(DisplayFrame { display, pixels });
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod test {
    use super::{composite, composite_all_displays, encode_png, CaptureError};
    use super::{Display, DisplayFrame, Frames, ScreenSource};

    /// A frame filled with one color, origin irrelevant to stitching.
    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DisplayFrame {
        DisplayFrame {
            display: Display {
                x: 0,
                y: 0,
                width,
                height,
            },
            pixels: image::RgbaImage::from_pixel(width, height, image::Rgba(rgba)),
        }
    }

    struct FakeScreens(Vec<(u32, u32, [u8; 4])>);
    impl ScreenSource for FakeScreens {
        fn capture_all(&self) -> Result<Frames, CaptureError> {
            Ok(self.0.iter().map(|&(w, h, c)| solid(w, h, c)).collect())
        }
    }

    #[test]
    fn canvas_spans_all_displays() {
        let frames = [
            solid(1920, 1080, [1, 2, 3, 255]),
            solid(1280, 1024, [4, 5, 6, 255]),
        ];
        let canvas = composite(&frames).unwrap();
        assert_eq!(canvas.dimensions(), (3200, 1080));
    }

    #[test]
    fn zero_displays_is_an_error() {
        assert!(matches!(composite(&[]), Err(CaptureError::NoDisplays)));

        let empty = FakeScreens(Vec::new());
        assert!(matches!(
            composite_all_displays(&empty),
            Err(CaptureError::NoDisplays)
        ));
    }

    #[test]
    fn mismatched_frame_is_an_error() {
        let mut frame = solid(4, 4, [0, 0, 0, 255]);
        // Lie about the display size.
        frame.display.width = 8;
        assert!(matches!(
            composite(&[frame]),
            Err(CaptureError::MismatchedFrame)
        ));
    }

    #[test]
    fn frames_land_at_cumulative_offsets() {
        const RED: [u8; 4] = [255, 0, 0, 255];
        const BLUE: [u8; 4] = [0, 0, 255, 255];
        const CLEAR: [u8; 4] = [0, 0, 0, 0];

        let canvas = composite(&[solid(2, 2, RED), solid(3, 1, BLUE)]).unwrap();
        assert_eq!(canvas.dimensions(), (5, 2));

        for (x, y, pixel) in canvas.enumerate_pixels() {
            let expect = if x < 2 {
                RED
            } else if y < 1 {
                BLUE
            } else {
                // Below the shorter display: untouched, transparent.
                CLEAR
            };
            assert_eq!(pixel.0, expect, "wrong pixel at ({x}, {y})");
        }
    }

    #[test]
    fn encoding_round_trips_losslessly() {
        // A gradient so every pixel is distinct-ish, plus a transparent strip.
        let frames = [
            DisplayFrame {
                display: Display {
                    x: 0,
                    y: 0,
                    width: 16,
                    height: 16,
                },
                pixels: image::RgbaImage::from_fn(16, 16, |x, y| {
                    image::Rgba([x as u8 * 16, y as u8 * 16, 7, 255])
                }),
            },
            solid(4, 8, [9, 9, 9, 200]),
        ];
        let canvas = composite(&frames).unwrap();
        let bytes = encode_png(&canvas).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), canvas.dimensions());
        assert_eq!(decoded.as_raw(), canvas.as_raw());
    }

    #[test]
    fn pipeline_produces_png() {
        let screens = FakeScreens(vec![(8, 8, [1, 2, 3, 255]), (4, 4, [4, 5, 6, 255])]);
        let bytes = composite_all_displays(&screens).unwrap();
        // PNG magic.
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

        let decoded = image::load_from_memory(&bytes).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (12, 8));
    }
}
