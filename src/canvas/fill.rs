use crate::canvas::buffer::PixelBuffer;

/// Default channel tolerance: match almost any color, so a fill spreads
/// across anti-aliased residue as if the region were uniform.
pub const DEFAULT_TOLERANCE: u8 = 254;

/// Scanline flood fill with per-channel tolerance.
///
/// Replaces every 4-connected pixel reachable from the seed whose channel-wise
/// absolute difference from the seed's original color is within `tolerance`
/// on all four channels. No-op when the seed already equals the fill color or
/// lies outside the buffer.
pub fn flood_fill(buf: &mut PixelBuffer, x: i32, y: i32, fill: [u8; 4], tolerance: u8) {
    let width = buf.width();
    let height = buf.height();
    if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
        return;
    }
    let start_x = x as usize;
    let start_y = y as usize;
    let seed = buf.get(start_x, start_y);

    if seed == fill {
        return;
    }

    let data = buf.data_mut();
    let tol = tolerance as i16;

    let matches = |data: &[u8], idx: usize| {
        let o = idx * 4;
        (data[o] as i16 - seed[0] as i16).abs() <= tol
            && (data[o + 1] as i16 - seed[1] as i16).abs() <= tol
            && (data[o + 2] as i16 - seed[2] as i16).abs() <= tol
            && (data[o + 3] as i16 - seed[3] as i16).abs() <= tol
    };

    let set = |data: &mut [u8], idx: usize| {
        let o = idx * 4;
        data[o..o + 4].copy_from_slice(&fill);
    };

    // Stack of span seeds; each pop expands one horizontal scanline and
    // pushes at most one seed per contiguous matching span above and below.
    let mut stack = vec![(start_x, start_y)];

    while let Some((sx, sy)) = stack.pop() {
        let mut x = sx;
        let mut idx = sy * width + x;

        // Walk to the leftmost matching pixel of this scanline.
        while matches(data, idx) {
            if x == 0 {
                break;
            }
            x -= 1;
            idx -= 1;
        }
        if !matches(data, idx) {
            x += 1;
            idx += 1;
        }

        let mut span_above = false;
        let mut span_below = false;

        // Fill rightwards, seeding the rows above and below once per span.
        while x < width && matches(data, idx) {
            set(data, idx);

            if sy > 0 {
                let above = idx - width;
                if matches(data, above) {
                    if !span_above {
                        stack.push((x, sy - 1));
                        span_above = true;
                    }
                } else {
                    span_above = false;
                }
            }

            if sy + 1 < height {
                let below = idx + width;
                if matches(data, below) {
                    if !span_below {
                        stack.push((x, sy + 1));
                        span_below = true;
                    }
                } else {
                    span_below = false;
                }
            }

            x += 1;
            idx += 1;
        }
    }
}
