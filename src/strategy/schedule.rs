//! Blocksize schedules

use crate::core::error::{LatticeError, Result};

/// Light prereduction ramp placed in front of every explicit range
const EXPLICIT_RAMP: std::ops::Range<i64> = 10..40;

/// Low ramp of the default schedule
const DEFAULT_RAMP: std::ops::Range<i64> = 10..50;

/// Immutable, ordered blocksizes; duplicates allowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlocksizeSchedule {
    blocksizes: Vec<usize>,
}

/// Python-style range(start, stop, step)
fn stepped_range(start: i64, stop: i64, step: i64) -> Vec<i64> {
    let mut out = Vec::new();
    let mut x = start;
    if step > 0 {
        while x < stop {
            out.push(x);
            x += step;
        }
    } else if step < 0 {
        while x > stop {
            out.push(x);
            x += step;
        }
    }
    out
}

impl BlocksizeSchedule {
    /// Keep entries that are usable blocksizes (>= 2)
    fn from_values(values: impl IntoIterator<Item = i64>) -> Self {
        BlocksizeSchedule {
            blocksizes: values.into_iter().filter(|&b| b >= 2).map(|b| b as usize).collect(),
        }
    }

    /// [10..40) followed by the range "high", "low:high" or "low:high:inc"
    pub fn explicit(blocksizes: &str) -> Result<Self> {
        let parts = blocksizes
            .split(':')
            .map(|p| {
                p.trim()
                    .parse::<i64>()
                    .map_err(|e| LatticeError::invalid_parameters(format!("blocksizes '{}': {}", blocksizes, e)))
            })
            .collect::<Result<Vec<i64>>>()?;
        let (low, high, inc) = match parts.as_slice() {
            [high] => (0, *high, 1),
            [low, high] => (*low, *high, 1),
            [low, high, inc] => (*low, *high, *inc),
            _ => {
                return Err(LatticeError::invalid_parameters(format!(
                    "blocksizes '{}' must be high, low:high or low:high:inc",
                    blocksizes
                )))
            }
        };
        if inc == 0 {
            return Err(LatticeError::invalid_parameters(format!(
                "blocksizes '{}': increment must not be zero",
                blocksizes
            )));
        }
        Ok(Self::from_values(EXPLICIT_RAMP.chain(stepped_range(low, high, inc))))
    }

    /// Ramp around a predicted blocksize b:
    /// [10..50) ++ range(70, b-15, 10) ++ [b-15] ++ range(b-13, b+25, 2)
    ///
    /// Tail entries not above the low ramp are dropped, so the schedule
    /// never falls back below a blocksize it already ran.
    pub fn default_for(predicted: usize) -> Self {
        let b = predicted as i64;
        let tail = stepped_range(70, b - 15, 10)
            .into_iter()
            .chain(std::iter::once(b - 15))
            .chain(stepped_range(b - 13, b + 25, 2))
            .filter(|&x| x >= DEFAULT_RAMP.end);
        Self::from_values(DEFAULT_RAMP.chain(tail))
    }

    /// Explicit schedule when a blocksize range is given, the default ramp otherwise
    pub fn build(blocksizes: Option<&str>, predicted: usize) -> Result<Self> {
        match blocksizes {
            Some(blocksizes) => Self::explicit(blocksizes),
            None => Ok(Self::default_for(predicted)),
        }
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.blocksizes
    }

    pub fn len(&self) -> usize {
        self.blocksizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocksizes.is_empty()
    }

    /// The `steps` entries following the first occurrence of `blocksize`
    pub fn upcoming(&self, blocksize: usize, steps: usize) -> &[usize] {
        match self.blocksizes.iter().position(|&b| b == blocksize) {
            Some(i) => {
                let start = i + 1;
                let end = (start + steps).min(self.blocksizes.len());
                &self.blocksizes[start..end]
            }
            None => &[],
        }
    }

    pub fn cursor(&self) -> ScheduleCursor<'_> {
        ScheduleCursor {
            schedule: self,
            position: 0,
        }
    }
}

/// Read position in a schedule, advanced by the driver
#[derive(Debug, Clone)]
pub struct ScheduleCursor<'a> {
    schedule: &'a BlocksizeSchedule,
    position: usize,
}

impl<'a> ScheduleCursor<'a> {
    /// Index of the next blocksize to be returned
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<'a> Iterator for ScheduleCursor<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let b = self.schedule.blocksizes.get(self.position).copied()?;
        self.position += 1;
        Some(b)
    }
}
