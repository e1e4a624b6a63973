// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Ink capture and rendering geometry.
//!
//! Pointer samples flow through the pressure curve, Gaussian smoothing and
//! Lowe's simplification to become a compact stroke; the ribbon stroker turns
//! a stored stroke back into a filled outline.

pub mod pressure;
pub mod ribbon;
pub mod simplify;
pub mod smoothing;

pub use ribbon::RibbonStroker;

use crate::config::{Config, PressureCurve, Simplify, Smoothing};
use crate::model::StrokePoint;
use kurbo::Point;

/// Pressure reported for devices without a pressure sensor
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// One raw pointer sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    /// In `[0, 1]`, already mapped through the pressure curve
    pub pressure: f64,
    /// Seconds
    pub time: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, pressure: f64, time: f64) -> Self {
        Self {
            x,
            y,
            pressure,
            time,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Squared distance over x, y and pressure
    pub fn distance_sq(&self, other: &Sample) -> f64 {
        (self.x - other.x).powi(2)
            + (self.y - other.y).powi(2)
            + (self.pressure - other.pressure).powi(2)
    }
}

/// Result of processing one pen gesture
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedStroke {
    /// Position of the first retained point; the stroke's frame translation
    pub origin: Point,
    /// Retained points relative to `origin`
    pub points: Vec<StrokePoint>,
    /// Pressure shared by every point when it does not vary, else 1.0
    pub width_scale: f64,
    /// Samples per second over the gesture, 0 when it took no time
    pub rate: f64,
    /// Number of raw samples
    pub raw_len: usize,
}

impl ProcessedStroke {
    /// True when the gesture took no time, a tap rather than a stroke
    pub fn is_instant(&self) -> bool {
        self.rate == 0.0
    }
}

/// Turns raw samples of one pen gesture into a simplified stroke
#[derive(Debug, Clone)]
pub struct StrokeProcessor {
    curve: PressureCurve,
    smoothing: Smoothing,
    simplify: Simplify,
}

impl StrokeProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            curve: config.pressure_curve,
            smoothing: config.smoothing,
            simplify: config.simplify,
        }
    }

    /// Build a sample from raw device input.
    ///
    /// Devices without pressure get [`DEFAULT_PRESSURE`], which is not curved.
    pub fn sample(&self, pos: Point, raw_pressure: Option<f64>, time: f64) -> Sample {
        let pressure = match raw_pressure {
            Some(p) => self.curve.apply(p.clamp(0.0, 1.0)),
            None => DEFAULT_PRESSURE,
        };
        Sample::new(pos.x, pos.y, pressure, time)
    }

    /// Smooth and simplify a gesture.
    ///
    /// Returns `None` for an empty gesture; the caller must not create a
    /// content item in that case.
    pub fn process(&self, samples: &[Sample]) -> Option<ProcessedStroke> {
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            tracing::warn!("Zero length stroke");
            return None;
        };

        let duration = last.time - first.time;
        let rate = if duration > 0.0 {
            samples.len() as f64 / duration
        } else {
            0.0
        };

        let mut smoothed = samples.to_vec();
        smoothing::gaussian_smoothing(&mut smoothed, self.smoothing);

        // The pressure channel is weighted up so that width changes count
        // about as much as small positional changes.
        let weighted: Vec<[f64; 3]> = smoothed
            .iter()
            .map(|s| [s.x, s.y, s.pressure * self.simplify.pressure_weight])
            .collect();
        let kept = simplify::simplify(&weighted, self.simplify.tolerance);

        let retained: Vec<Sample> = kept.iter().map(|&i| smoothed[i]).collect();
        let origin = retained[0].point();
        let p0 = retained[0].pressure;
        let uniform = retained.iter().all(|s| (s.pressure - p0).abs() < 1e-9);

        let points = retained
            .iter()
            .map(|s| {
                let (dx, dy) = (s.x - origin.x, s.y - origin.y);
                if uniform {
                    StrokePoint::new(dx, dy)
                } else {
                    StrokePoint::with_width(dx, dy, s.pressure)
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Stroke simplification: {} -> {} points, rate {:.1}/s",
            samples.len(),
            points.len(),
            rate
        );

        Some(ProcessedStroke {
            origin,
            points,
            width_scale: if uniform { p0 } else { 1.0 },
            rate,
            raw_len: samples.len(),
        })
    }
}
