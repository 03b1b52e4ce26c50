//! Fractal level detection.
//!
//! FRACTAL_HIGH(W, O)[i] = max(high[j] for j in i-O-W..i-O)
//! FRACTAL_LOW(W, O)[i]  = min(low[j]  for j in i-O-W..i-O)
//! The current bar and the O bars before it are excluded.
//! Warmup: bars with i < O + W have no level.

use super::bar::PriceSeries;
use super::error::FractalShiftError;

pub const DEFAULT_WINDOW: usize = 5;
pub const DEFAULT_OFFSET: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractalLevel {
    pub index: usize,
    pub high: f64,
    pub low: f64,
}

/// Fractal levels aligned to bar indices of the source series.
#[derive(Debug, Clone, PartialEq)]
pub struct FractalSeries {
    pub window: usize,
    pub offset: usize,
    levels: Vec<Option<FractalLevel>>,
}

impl FractalSeries {
    pub fn get(&self, index: usize) -> Option<&FractalLevel> {
        self.levels.get(index).and_then(|l| l.as_ref())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// First bar index carrying a level.
    pub fn warmup(&self) -> usize {
        self.window + self.offset
    }
}

/// Minimum series length accepted by [`detect_fractals`].
pub fn minimum_bars(window: usize, offset: usize) -> usize {
    window + offset + 1
}

pub fn detect_fractals(
    series: &PriceSeries,
    window: usize,
    offset: usize,
) -> Result<FractalSeries, FractalShiftError> {
    if window < 2 {
        return Err(FractalShiftError::invalid_config(
            "window",
            "window must be at least 2",
        ));
    }

    let minimum = minimum_bars(window, offset);
    if series.len() < minimum {
        return Err(FractalShiftError::InsufficientData {
            bars: series.len(),
            minimum,
        });
    }

    let bars = series.bars();
    let warmup = window + offset;
    let mut levels = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        if i < warmup {
            levels.push(None);
            continue;
        }

        let slice = &bars[i - warmup..i - offset];
        let high = slice
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let low = slice.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

        levels.push(Some(FractalLevel {
            index: i,
            high,
            low,
        }));
    }

    Ok(FractalSeries {
        window,
        offset,
        levels,
    })
}
