/*!
    Per-session scratch buffers.
*/

use ffmpeg_types::{Error, PlanarYuvFrame, Result};

/**
    Converted picture and compressed output storage for one session.

    Both are sized once at open for the session's resolution and released
    when the session drops them. The output buffer holds `width * height * 3`
    bytes, a loose upper bound on any single packet.
*/
#[derive(Debug)]
pub struct ScratchBuffers {
    planar: PlanarYuvFrame,
    output: Vec<u8>,
}

impl ScratchBuffers {
    pub fn allocate(width: u32, height: u32) -> Result<Self> {
        let planar = PlanarYuvFrame::try_new(width, height)?;

        let len = Self::output_len(width, height).ok_or_else(|| {
            Error::resource(format!("output buffer for {}x{} overflows", width, height))
        })?;
        let mut output = Vec::new();
        output.try_reserve_exact(len).map_err(|e| {
            Error::resource(format!("cannot allocate {} byte output buffer: {}", len, e))
        })?;
        output.resize(len, 0);

        Ok(Self { planar, output })
    }

    pub fn output_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)
    }

    pub fn planar(&self) -> &PlanarYuvFrame {
        &self.planar
    }

    pub fn planar_mut(&mut self) -> &mut PlanarYuvFrame {
        &mut self.planar
    }

    pub fn output_mut(&mut self) -> &mut [u8] {
        &mut self.output
    }

    /**
        Converted picture for reading and output buffer for writing, at once.
    */
    pub fn split_mut(&mut self) -> (&PlanarYuvFrame, &mut [u8]) {
        (&self.planar, &mut self.output)
    }

    /// Total bytes held.
    pub fn byte_len(&self) -> usize {
        self.planar.as_bytes().len() + self.output.len()
    }
}
