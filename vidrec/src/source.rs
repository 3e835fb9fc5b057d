/*!
    Frame sources for the command-line tool.

    Both produce packed 32-bit pixels in `B, G, R, A` byte order.
*/

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image::imageops::FilterType;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

pub enum FrameSource {
    Pattern(TestPattern),
    Images(ImageSequence),
}

impl FrameSource {
    pub fn new(input_dir: Option<&Path>, width: u32, height: u32) -> Result<Self> {
        Ok(match input_dir {
            Some(dir) => Self::Images(ImageSequence::open(dir, width, height)?),
            None => Self::Pattern(TestPattern::new(width, height)),
        })
    }

    /// Frames encoded when no count is requested.
    pub fn default_frames(&self) -> u64 {
        match self {
            Self::Pattern(_) => 100,
            Self::Images(images) => images.count() as u64,
        }
    }

    pub fn frame(&mut self, index: u64) -> Result<&[u8]> {
        match self {
            Self::Pattern(pattern) => Ok(pattern.render(index)),
            Self::Images(images) => images.load(index),
        }
    }
}

/**
    Horizontal gradient scrolling by two pixels per frame, with a white bar
    moving down.
*/
pub struct TestPattern {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TestPattern {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn render(&mut self, index: u64) -> &[u8] {
        let width = self.width as usize;
        let height = self.height as usize;
        let shift = (index * 2) as usize;
        let bar_height = (height / 8).max(1);
        let bar_top = (index as usize * 3) % height;

        for (y, row) in self.pixels.chunks_exact_mut(width * 4).enumerate() {
            let in_bar = (y + height - bar_top) % height < bar_height;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                if in_bar {
                    px.copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
                    continue;
                }
                let t = ((x + shift) % width * 255 / width.max(1)) as u8;
                let v = (y * 255 / height.max(1)) as u8;
                px.copy_from_slice(&[255 - t, v, t, 0xFF]);
            }
        }

        &self.pixels
    }
}

/**
    Still images from a directory, sorted by name, resized to the output size.
*/
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageSequence {
    pub fn open(dir: &Path, width: u32, height: u32) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("could not read directory {}", dir.display()))?
        {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    IMAGE_EXTENSIONS
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(ext))
                });
            if is_image {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            bail!("no images found in {}", dir.display());
        }
        paths.sort();

        Ok(Self {
            paths,
            width,
            height,
            pixels: Vec::new(),
        })
    }

    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /**
        Load image `index`, wrapping around past the last one.
    */
    pub fn load(&mut self, index: u64) -> Result<&[u8]> {
        let path = &self.paths[(index % self.paths.len() as u64) as usize];
        let image = image::open(path)
            .with_context(|| format!("could not load {}", path.display()))?
            .resize_exact(self.width, self.height, FilterType::Triangle)
            .to_rgba8();

        self.pixels.clear();
        self.pixels.reserve(image.as_raw().len());
        for px in image.pixels() {
            let [r, g, b, a] = px.0;
            self.pixels.extend_from_slice(&[b, g, r, a]);
        }

        Ok(&self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_moves_between_frames() {
        let mut pattern = TestPattern::new(32, 16);
        let first = pattern.render(0).to_vec();
        let second = pattern.render(1).to_vec();
        assert_eq!(first.len(), 32 * 16 * 4);
        assert_ne!(first, second);
        assert!(first.chunks_exact(4).all(|px| px[3] == 0xFF));
    }

    #[test]
    fn images_are_sorted_resized_and_swizzled() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .save(dir.path().join("b.png"))
            .unwrap();
        image::RgbaImage::from_pixel(8, 2, image::Rgba([200, 100, 50, 255]))
            .save(dir.path().join("a.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = FrameSource::new(Some(dir.path()), 2, 2).unwrap();
        assert_eq!(source.default_frames(), 2);

        let first = source.frame(0).unwrap().to_vec();
        assert_eq!(first.len(), 2 * 2 * 4);
        assert_eq!(&first[..4], &[50, 100, 200, 255]);

        let wrapped = source.frame(3).unwrap();
        assert_eq!(&wrapped[..4], &[30, 20, 10, 255]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FrameSource::new(Some(dir.path()), 2, 2).is_err());
    }
}
