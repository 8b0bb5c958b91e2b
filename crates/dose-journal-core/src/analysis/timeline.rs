//! Timeline shapes for drawing intensity over time.
//!
//! Coordinates are `(seconds since ingestion, intensity)` with intensity 0.0
//! at baseline and 1.0 at peak. Two shapes exist depending on how complete
//! the reference duration is:
//!
//! ```text
//! Full:        onset   comeup    peak    offset
//!            ________/‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾\________
//!
//! Total only:      .-‾‾‾-.
//!            ____/        \____
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{DurationRange, ReferenceDuration, SecondsRange};

/// Weight used to pick a representative point inside each duration range.
pub const INTERPOLATION_WEIGHT: f64 = 0.5;

/// A point on a timeline path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub seconds: f64,
    pub intensity: f64,
}

impl Point {
    pub fn new(seconds: f64, intensity: f64) -> Self {
        Self { seconds, intensity }
    }
}

/// One drawing instruction of a path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum PathSegment {
    LineTo(Point),
    /// Quadratic Bézier curve from the previous point to `end`.
    QuadTo { control: Point, end: Point },
}

impl PathSegment {
    fn end(&self) -> Point {
        match self {
            PathSegment::LineTo(p) => *p,
            PathSegment::QuadTo { end, .. } => *end,
        }
    }
}

/// A drawable path made of lines and quadratic curves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelinePath {
    pub start: Point,
    pub segments: Vec<PathSegment>,
}

impl TimelinePath {
    fn starting_at(start: Point) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    fn line_to(mut self, seconds: f64, intensity: f64) -> Self {
        self.segments.push(PathSegment::LineTo(Point::new(seconds, intensity)));
        self
    }

    fn quad_to(mut self, control: Point, end: Point) -> Self {
        self.segments.push(PathSegment::QuadTo { control, end });
        self
    }

    /// Flatten into points, sampling each curve with `samples_per_curve` steps.
    pub fn points(&self, samples_per_curve: usize) -> Vec<Point> {
        let steps = samples_per_curve.max(1);
        let mut points = vec![self.start];
        let mut current = self.start;

        for segment in &self.segments {
            match segment {
                PathSegment::LineTo(p) => points.push(*p),
                PathSegment::QuadTo { control, end } => {
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        points.push(quadratic_point(current, *control, *end, t));
                    }
                }
            }
            current = segment.end();
        }

        points
    }

    /// Copy with every intensity multiplied by `height`.
    pub fn scaled(&self, height: f64) -> Self {
        let scale = |p: Point| Point::new(p.seconds, p.intensity * height);
        Self {
            start: scale(self.start),
            segments: self
                .segments
                .iter()
                .map(|segment| match segment {
                    PathSegment::LineTo(p) => PathSegment::LineTo(scale(*p)),
                    PathSegment::QuadTo { control, end } => PathSegment::QuadTo {
                        control: scale(*control),
                        end: scale(*end),
                    },
                })
                .collect(),
        }
    }
}

fn quadratic_point(p0: Point, control: Point, p1: Point, t: f64) -> Point {
    let u = 1.0 - t;
    Point::new(
        u * u * p0.seconds + 2.0 * u * t * control.seconds + t * t * p1.seconds,
        u * u * p0.intensity + 2.0 * u * t * control.intensity + t * t * p1.intensity,
    )
}

/// Interval of estimated peak intensity, in seconds since ingestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PeakWindow {
    pub start: f64,
    pub end: f64,
}

/// Timeline built from all four phases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FullTimeline {
    pub onset: SecondsRange,
    pub comeup: SecondsRange,
    pub peak: SecondsRange,
    pub offset: SecondsRange,
}

impl FullTimeline {
    /// Total drawn width in seconds.
    pub fn width(&self) -> f64 {
        self.onset.max + self.comeup.max + self.peak.max + self.offset.max
    }

    /// Main stroke through the interpolated phase durations.
    pub fn center(&self) -> TimelinePath {
        let onset_end = self.onset.interpolate_at(INTERPOLATION_WEIGHT);
        let comeup_end = onset_end + self.comeup.interpolate_at(INTERPOLATION_WEIGHT);
        let peak_end = comeup_end + self.peak.interpolate_at(INTERPOLATION_WEIGHT);
        let offset_end = peak_end + self.offset.interpolate_at(INTERPOLATION_WEIGHT);

        TimelinePath::starting_at(Point::new(0.0, 0.0))
            .line_to(onset_end, 0.0)
            .line_to(comeup_end, 1.0)
            .line_to(peak_end, 1.0)
            .line_to(offset_end, 0.0)
    }

    /// Closed polygon covering every min/max combination of the phases.
    ///
    /// The outer leg takes the shortest rise and the longest fall; the return
    /// leg takes the longest rise and the shortest fall.
    pub fn envelope(&self) -> TimelinePath {
        let earliest_rise_end = self.onset.min + self.comeup.min;
        let latest_rise_end = self.onset.max + self.comeup.max;
        let earliest_peak_end = earliest_rise_end + self.peak.min;
        let latest_peak_end = latest_rise_end + self.peak.max;

        TimelinePath::starting_at(Point::new(self.onset.min, 0.0))
            .line_to(earliest_rise_end, 1.0)
            .line_to(latest_peak_end, 1.0)
            .line_to(self.width(), 0.0)
            .line_to(earliest_peak_end + self.offset.min, 0.0)
            .line_to(earliest_peak_end, 1.0)
            .line_to(latest_rise_end, 1.0)
            .line_to(self.onset.max, 0.0)
            .line_to(self.onset.min, 0.0)
    }

    pub fn peak_window(&self) -> PeakWindow {
        let start = self.onset.interpolate_at(INTERPOLATION_WEIGHT)
            + self.comeup.interpolate_at(INTERPOLATION_WEIGHT);
        PeakWindow {
            start,
            end: start + self.peak.interpolate_at(INTERPOLATION_WEIGHT),
        }
    }
}

/// Timeline built only from the total duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TotalTimeline {
    pub total: SecondsRange,
}

impl TotalTimeline {
    pub fn width(&self) -> f64 {
        self.total.max
    }

    /// Smooth bump peaking halfway through the interpolated total.
    pub fn center(&self) -> TimelinePath {
        bump(Point::new(0.0, 0.0), self.total.interpolate_at(INTERPOLATION_WEIGHT))
    }

    /// Band between the shortest and the longest total duration.
    pub fn envelope(&self) -> TimelinePath {
        let mut path = bump(Point::new(0.0, 0.0), self.total.max);
        path.segments.push(PathSegment::LineTo(Point::new(self.total.min, 0.0)));
        // return along the shortest bump, drawn backwards
        path.segments.push(PathSegment::QuadTo {
            control: Point::new(self.total.min / 2.0, BUMP_CONTROL_INTENSITY),
            end: Point::new(0.0, 0.0),
        });
        path
    }
}

/// A quadratic curve peaks at half its control height.
const BUMP_CONTROL_INTENSITY: f64 = 2.0;

fn bump(start: Point, length: f64) -> TimelinePath {
    TimelinePath::starting_at(start).quad_to(
        Point::new(start.seconds + length / 2.0, BUMP_CONTROL_INTENSITY),
        Point::new(start.seconds + length, 0.0),
    )
}

/// Drawable shape derived from a reference duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TimelineShape {
    Full(FullTimeline),
    TotalOnly(TotalTimeline),
}

impl TimelineShape {
    pub fn width(&self) -> f64 {
        match self {
            TimelineShape::Full(full) => full.width(),
            TimelineShape::TotalOnly(total) => total.width(),
        }
    }

    pub fn center(&self) -> TimelinePath {
        match self {
            TimelineShape::Full(full) => full.center(),
            TimelineShape::TotalOnly(total) => total.center(),
        }
    }

    pub fn envelope(&self) -> TimelinePath {
        match self {
            TimelineShape::Full(full) => full.envelope(),
            TimelineShape::TotalOnly(total) => total.envelope(),
        }
    }

    /// Only the full shape knows when the peak happens.
    pub fn peak_window(&self) -> Option<PeakWindow> {
        match self {
            TimelineShape::Full(full) => Some(full.peak_window()),
            TimelineShape::TotalOnly(_) => None,
        }
    }
}

/// Build a timeline shape, preferring the full four-phase variant.
///
/// Returns `None` when neither the four phases nor the total are fully known.
pub fn build_timeline(reference: &ReferenceDuration) -> Option<TimelineShape> {
    match full_timeline(reference) {
        Some(full) => Some(TimelineShape::Full(full)),
        None => in_seconds(&reference.total).map(|total| TimelineShape::TotalOnly(TotalTimeline { total })),
    }
}

fn full_timeline(reference: &ReferenceDuration) -> Option<FullTimeline> {
    Some(FullTimeline {
        onset: in_seconds(&reference.onset)?,
        comeup: in_seconds(&reference.comeup)?,
        peak: in_seconds(&reference.peak)?,
        offset: in_seconds(&reference.offset)?,
    })
}

fn in_seconds(range: &Option<DurationRange>) -> Option<SecondsRange> {
    range.as_ref().and_then(DurationRange::in_seconds)
}
