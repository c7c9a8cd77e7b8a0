//! Tunable constants for tools and entities.

/// Initial radius of the brush used by the brush-select and brush-draw tools.
pub const DEFAULT_BRUSH_RADIUS: f64 = 10.0;

/// The brush radius never shrinks below this.
pub const MIN_BRUSH_RADIUS: f64 = 1.0;

/// Number of arc segments on each end cap of a brush stroke capsule.
pub const BRUSH_SEGMENTS: usize = 12;

/// Default scale applied to wheel deltas when resizing a brush.
pub const DEFAULT_BRUSH_WHEEL_RATE: f64 = 0.025;

/// Default step applied per bracket-key press when resizing a brush.
pub const DEFAULT_BRUSH_KEY_RATE: f64 = 2.0;

/// Minor-axis fraction used for a freshly drawn oriented ellipse before its
/// third control point is placed.
pub const ELLIPSE_MINOR_AXIS_FRACTION: f64 = 0.1;

/// Number of extreme points collected before an assisted-segmentation
/// request is dispatched.
pub const DEXTR_POINT_COUNT: usize = 4;

/// Half extent of the fixed marker box around a composite label's centroid.
pub const COMPOSITE_BOX_HALF_EXTENT: f64 = 1.0;

/// Fixed iteration count for the closest-point-on-ellipse projection.
pub const ELLIPSE_CLOSEST_POINT_ITERATIONS: usize = 3;
