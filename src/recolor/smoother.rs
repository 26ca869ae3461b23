//! 3x3 weighted blur restricted to edge pixels

use super::classifier::{ClassMap, PixelClass};
use crate::{
    error::{RecolorError, Result},
    raster::{try_alloc, Raster, CHANNELS},
};
use rayon::prelude::*;

/// Blur weights, row-major, centered on the pixel being smoothed
pub const KERNEL: [[u32; 3]; 3] = [[1, 2, 1], [2, 4, 2], [1, 2, 1]];

/// Replace every edge pixel with the kernel-weighted mean of its neighborhood
///
/// Reads only from `recolored` and writes into a fresh buffer, so the result
/// does not depend on scan order. Neighbors outside the raster are dropped
/// from both the weighted sum and the weight total. All four channels are
/// averaged; non-edge pixels are copied through.
///
/// # Errors
/// - `BufferSizeMismatch` if `classes` does not match the raster dimensions
/// - `Allocation` if the output raster cannot be allocated
pub fn smooth_edges(recolored: &Raster, classes: &ClassMap) -> Result<Raster> {
    let (width, height) = recolored.dimensions();
    if classes.dimensions() != (width, height) {
        let (class_width, class_height) = classes.dimensions();
        return Err(RecolorError::BufferSizeMismatch {
            expected: recolored.pixel_count(),
            actual: class_width as usize * class_height as usize,
        });
    }

    let snapshot = recolored.as_bytes();
    let mut data = try_alloc::<u8>(snapshot.len(), "smoothed raster")?;
    data.extend_from_slice(snapshot);

    let row_len = width as usize * CHANNELS;
    let class_rows = classes.as_slice().par_chunks_exact(width as usize);

    data.par_chunks_exact_mut(row_len)
        .zip(class_rows)
        .enumerate()
        .for_each(|(y, (row, row_classes))| {
            for (x, (out, class)) in row
                .chunks_exact_mut(CHANNELS)
                .zip(row_classes)
                .enumerate()
            {
                if *class == PixelClass::Edge {
                    out.copy_from_slice(&weighted_average(snapshot, width, height, x, y));
                }
            }
        });

    Raster::from_rgba(width, height, data)
}

fn weighted_average(snapshot: &[u8], width: u32, height: u32, x: usize, y: usize) -> [u8; 4] {
    let (width, height) = (width as usize, height as usize);
    let mut sums = [0u32; 4];
    let mut weight_total = 0u32;

    for (ky, kernel_row) in KERNEL.iter().enumerate() {
        let Some(ny) = (y + ky).checked_sub(1).filter(|&ny| ny < height) else {
            continue;
        };
        for (kx, &weight) in kernel_row.iter().enumerate() {
            let Some(nx) = (x + kx).checked_sub(1).filter(|&nx| nx < width) else {
                continue;
            };
            let offset = (ny * width + nx) * CHANNELS;
            if let Some(px) = snapshot.get(offset..offset + CHANNELS) {
                for (sum, &channel) in sums.iter_mut().zip(px) {
                    *sum += weight * u32::from(channel);
                }
                weight_total += weight;
            }
        }
    }

    // The center pixel is always in bounds, so weight_total >= 4
    sums.map(|sum| ((sum + weight_total / 2) / weight_total.max(1)) as u8)
}
