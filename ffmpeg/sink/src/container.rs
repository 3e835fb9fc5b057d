/*!
    Container format selection.
*/

use std::ffi::{CStr, CString};
use std::fmt;
use std::path::Path;
use std::ptr;
use std::str::FromStr;

use ffmpeg_next::ffi;

use ffmpeg_types::{Error, Result};

/// Muxer used when neither the hint nor the file name identifies one.
pub const FALLBACK_MUXER: &str = "mpeg";

/**
    A muxer known to the linked libavformat.
*/
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContainerFormat {
    name: String,
    long_name: String,
}

/**
    Outcome of [`ContainerFormat::resolve`].
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub format: ContainerFormat,
    /// Neither the hint nor the file name was recognized.
    pub fell_back: bool,
}

impl ContainerFormat {
    /**
        Ask libavformat for the muxer best matching a short name and/or a
        file name. A name match outranks an extension match.
    */
    pub fn guess(name: Option<&str>, path: Option<&Path>) -> Option<Self> {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .and_then(|name| CString::new(name).ok());
        let file = path.and_then(|path| CString::new(path.to_string_lossy().as_bytes()).ok());
        if name.is_none() && file.is_none() {
            return None;
        }

        unsafe {
            let format = ffi::av_guess_format(
                name.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
                file.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
                ptr::null(),
            );
            if format.is_null() {
                return None;
            }
            Some(Self {
                name: c_text((*format).name),
                long_name: c_text((*format).long_name),
            })
        }
    }

    /**
        Look a muxer up by its short name, ignoring case.
    */
    pub fn from_name(name: &str) -> Option<Self> {
        Self::guess(Some(name), None)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::guess(None, Some(path))
    }

    /**
        Pick the container for `path`.

        The hint and the file name are weighed together, as libavformat does.
        When neither matches, MPEG program stream is used and `fell_back` is
        set.
    */
    pub fn resolve(hint: Option<&str>, path: &Path) -> Result<Resolution> {
        if let Some(format) = Self::guess(hint, Some(path)) {
            return Ok(Resolution {
                format,
                fell_back: false,
            });
        }

        let format = Self::from_name(FALLBACK_MUXER).ok_or_else(|| {
            Error::configuration(format!("muxer '{}' is not available", FALLBACK_MUXER))
        })?;
        Ok(Resolution {
            format,
            fell_back: true,
        })
    }

    /**
        FFmpeg short name of the muxer.
    */
    pub fn muxer_name(&self) -> &str {
        &self.name
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }
}

fn c_text(text: *const std::os::raw::c_char) -> String {
    if text.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for ContainerFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
            .ok_or_else(|| Error::configuration(format!("unknown container format: {}", s)))
    }
}
