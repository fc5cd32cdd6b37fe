//! Fixed-quantum audio rendering.
//!
//! Host blocks have arbitrary length. The engine is always asked for at most
//! [`QUANTUM_FRAMES`] frames per call, rendered into an instance-owned
//! scratch pair and copied out. A block of N frames therefore costs
//! `ceil(N / 64)` engine calls.
//!
//! # Real-Time Safety
//!
//! - The scratch buffers are reserved once in [`RenderQuantum::allocate`]
//! - Rendering never allocates

use crate::engine::SynthEngine;
use crate::error::LoadResult;

/// Frames per engine render call.
pub const QUANTUM_FRAMES: usize = 64;

/// Scratch buffers for one render quantum.
pub struct RenderQuantum {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl RenderQuantum {
    /// Reserve both scratch buffers.
    ///
    /// Fails with [`LoadError::Allocation`](crate::LoadError::Allocation)
    /// instead of aborting when memory is exhausted.
    pub fn allocate() -> LoadResult<Self> {
        let mut left = Vec::new();
        left.try_reserve_exact(QUANTUM_FRAMES)?;
        left.resize(QUANTUM_FRAMES, 0.0);

        let mut right = Vec::new();
        right.try_reserve_exact(QUANTUM_FRAMES)?;
        right.resize(QUANTUM_FRAMES, 0.0);

        Ok(Self { left, right })
    }

    /// Render `frames` frames and copy them to the connected outputs.
    ///
    /// Outputs that are `None` are skipped, but the engine still renders so
    /// playback time keeps advancing. Connected outputs must hold at least
    /// `frames` samples; shorter buffers are filled as far as they reach.
    pub fn render<E: SynthEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        frames: usize,
        mut left_out: Option<&mut [f32]>,
        mut right_out: Option<&mut [f32]>,
    ) {
        let mut remaining = frames;
        let mut offset = 0;

        while remaining > 0 {
            let chunk = remaining.min(QUANTUM_FRAMES);
            let left = &mut self.left[..chunk];
            let right = &mut self.right[..chunk];

            engine.render_block(left, right);

            if let Some(out) = left_out.as_deref_mut() {
                copy_chunk(left, out, offset);
            }
            if let Some(out) = right_out.as_deref_mut() {
                copy_chunk(right, out, offset);
            }

            remaining -= chunk;
            offset += chunk;
        }
    }
}

fn copy_chunk(chunk: &[f32], out: &mut [f32], offset: usize) {
    let Some(dest) = out.get_mut(offset..) else {
        return;
    };
    let len = chunk.len().min(dest.len());
    dest[..len].copy_from_slice(&chunk[..len]);
}
