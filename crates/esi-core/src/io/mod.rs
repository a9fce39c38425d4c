pub mod image_io;
pub mod ser;

use std::path::Path;

use crate::error::Result;
use crate::frame::{Frame, FrameSource};

/// A frame sequence opened from disk.
pub enum InputStack {
    Ser(ser::SerReader),
    Images(Vec<Frame>),
}

impl InputStack {
    /// Open a frame sequence from disk.
    ///
    /// A directory loads every image file inside it, a `.tif`/`.tiff` file
    /// loads all of its pages, any other image extension loads one frame,
    /// and everything else is read as a SER recording.
    pub fn open(path: &Path) -> Result<Self> {
        if path.is_dir() {
            let paths = image_io::list_images(path)?;
            return Ok(Self::Images(image_io::load_frames(&paths)?));
        }
        if image_io::is_tiff(path) {
            return Ok(Self::Images(image_io::load_tiff_stack(path)?));
        }
        if image_io::has_image_extension(path) {
            return Ok(Self::Images(vec![image_io::load_image(path)?]));
        }
        Ok(Self::Ser(ser::SerReader::open(path)?))
    }

    pub fn source(&self) -> &dyn FrameSource {
        match self {
            Self::Ser(reader) => reader,
            Self::Images(frames) => frames,
        }
    }
}
