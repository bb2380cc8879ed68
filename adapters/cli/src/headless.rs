use std::io::Write;

use anyhow::{Context, Result};
use level_scene_rendering::{RenderingBackend, SceneBuffers, ScreenAnnotation};

/// Backend that reports each presented frame as text instead of drawing it.
#[derive(Debug)]
pub(crate) struct HeadlessBackend<W> {
    out: W,
    frames: usize,
}

impl<W: Write> HeadlessBackend<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderingBackend for HeadlessBackend<W> {
    fn present(&mut self, buffers: &SceneBuffers, annotations: &[ScreenAnnotation]) -> Result<()> {
        let [min_x, max_x] = buffers.visible_range;
        writeln!(
            self.out,
            "frame {}: {} quads visible in x={min_x:.1}..{max_x:.1}, {} color channels",
            self.frames,
            buffers.quad_count(),
            buffers.colors.len() / 4
        )
        .context("failed to write frame summary")?;

        for annotation in annotations {
            let [x, y] = annotation.position;
            writeln!(self.out, "  annotation at ({x:.1}, {y:.1}): {}", annotation.payload)
                .context("failed to write annotation")?;
        }

        self.frames += 1;
        Ok(())
    }
}
