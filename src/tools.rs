//! External converters
//!
//! Raster conversion, thumbnail resizing and preview compositing are
//! delegated to external executables. Invocation shapes are fixed and
//! documented per tool; only the executable paths are configurable. Stderr
//! is captured and folded into the error when a tool fails.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::PipelineError;

/// Executable paths for the delegated image steps.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    /// Converts one source file into a raster image: `<convert> <src> <dst>`
    pub convert: PathBuf,
    /// Resizes a raster image in place: `<resize> -resize <geometry> <img>`
    pub resize: PathBuf,
    /// Concatenates rasters into a strip: `<composite> +append <imgs..> <dst>`
    pub composite: PathBuf,
}

impl Default for ExternalTools {
    fn default() -> Self {
        Self {
            convert: PathBuf::from("dcmj2pnm"),
            resize: PathBuf::from("mogrify"),
            composite: PathBuf::from("convert"),
        }
    }
}

impl ExternalTools {
    /// Convert `src` into a raster image at `dst`.
    pub fn convert_to_raster(&self, src: &Path, dst: &Path) -> Result<(), PipelineError> {
        run_tool(&self.convert, &[src.as_os_str(), dst.as_os_str()], src)
    }

    /// Resize `img` in place to `geometry` (e.g. `96x96`).
    pub fn resize_in_place(&self, img: &Path, geometry: &str) -> Result<(), PipelineError> {
        run_tool(
            &self.resize,
            &[OsStr::new("-resize"), OsStr::new(geometry), img.as_os_str()],
            img,
        )
    }

    /// Concatenate `images` in order into a single strip at `dst`.
    pub fn composite_strip(&self, images: &[PathBuf], dst: &Path) -> Result<(), PipelineError> {
        let mut args: Vec<&OsStr> = Vec::with_capacity(images.len() + 2);
        args.push(OsStr::new("+append"));
        for image in images {
            args.push(image.as_os_str());
        }
        args.push(dst.as_os_str());
        run_tool(&self.composite, &args, dst)
    }
}

fn run_tool(exe: &Path, args: &[&OsStr], subject: &Path) -> Result<(), PipelineError> {
    tracing::debug!(tool = %exe.display(), subject = %subject.display(), "Invoking tool");

    let output = Command::new(exe)
        .args(args)
        .output()
        .map_err(|e| PipelineError::ExternalTool {
            tool: exe.display().to_string(),
            path: subject.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::ExternalTool {
            tool: exe.display().to_string(),
            path: subject.to_path_buf(),
            reason: format!("{}: {}", output.status, stderr.trim()),
        });
    }

    Ok(())
}
