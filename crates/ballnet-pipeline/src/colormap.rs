//! Displacement-magnitude coloring.

use ballnet_core::{ColorRange, ColormapSpec, ConfigError, ConfigResult, DenseDisplacementField, Rgba};

/// Viridis sampled at 11 evenly spaced points.
const VIRIDIS: [[f32; 3]; 11] = [
    [0.267, 0.005, 0.329],
    [0.283, 0.141, 0.458],
    [0.254, 0.265, 0.530],
    [0.207, 0.372, 0.553],
    [0.164, 0.471, 0.558],
    [0.128, 0.567, 0.551],
    [0.135, 0.659, 0.518],
    [0.267, 0.749, 0.441],
    [0.477, 0.821, 0.318],
    [0.741, 0.873, 0.150],
    [0.993, 0.906, 0.144],
];

/// A continuous colormap defined by evenly spaced RGB stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    stops: Vec<[f32; 3]>,
}

impl Colormap {
    /// The viridis colormap.
    pub fn viridis() -> Self {
        Self {
            stops: VIRIDIS.to_vec(),
        }
    }

    /// Creates a colormap from at least two stops with channels in `[0, 1]`.
    pub fn from_stops(stops: Vec<[f32; 3]>) -> ConfigResult<Self> {
        if stops.len() < 2 {
            return Err(ConfigError::InvalidColormap(format!(
                "at least 2 stops are required, got {}",
                stops.len()
            )));
        }
        if let Some(stop) = stops
            .iter()
            .find(|s| s.iter().any(|c| !(0.0..=1.0).contains(c)))
        {
            return Err(ConfigError::InvalidColormap(format!(
                "stop {:?} has a channel outside [0, 1]",
                stop
            )));
        }
        Ok(Self { stops })
    }

    /// Builds the colormap named by a manifest entry.
    pub fn from_spec(spec: &ColormapSpec) -> ConfigResult<Self> {
        match spec {
            ColormapSpec::Viridis => Ok(Self::viridis()),
            ColormapSpec::Stops { stops } => Self::from_stops(stops.clone()),
        }
    }

    /// Linearly interpolated color at `t`, clamped to `[0, 1]`.
    pub fn sample(&self, t: f32) -> [f32; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.stops.len() - 1;
        let scaled = t * last as f32;
        let i = (scaled.floor() as usize).min(last - 1);
        let frac = scaled - i as f32;
        let (a, b) = (self.stops[i], self.stops[i + 1]);
        [
            a[0] + (b[0] - a[0]) * frac,
            a[1] + (b[1] - a[1]) * frac,
            a[2] + (b[2] - a[2]) * frac,
        ]
    }

    /// 8-bit color at `t`. Channels are truncated, not rounded; alpha is 255.
    pub fn sample_rgba8(&self, t: f32) -> Rgba {
        let [r, g, b] = self.sample(t);
        [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8, 255]
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Self::viridis()
    }
}

/// Maps displacement magnitudes onto a colormap over a fixed range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorMapper {
    range: ColorRange,
    colormap: Colormap,
}

impl ColorMapper {
    pub fn new(range: ColorRange, colormap: Colormap) -> Self {
        Self { range, colormap }
    }

    pub fn range(&self) -> ColorRange {
        self.range
    }

    pub fn colormap(&self) -> &Colormap {
        &self.colormap
    }

    /// Color for one displacement magnitude. Magnitudes outside the range
    /// take the color of the nearest bound.
    pub fn color_for(&self, magnitude: f32) -> Rgba {
        self.colormap.sample_rgba8(self.range.normalize(magnitude))
    }

    /// One color per vertex of `dense`.
    pub fn map(&self, dense: &DenseDisplacementField) -> Vec<Rgba> {
        dense
            .magnitudes()
            .into_iter()
            .map(|m| self.color_for(m))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viridis_endpoints() {
        let cmap = Colormap::viridis();
        // 0.267 * 255 = 68.085, truncated
        assert_eq!(cmap.sample_rgba8(0.0), [68, 1, 83, 255]);
        assert_eq!(cmap.sample_rgba8(1.0), [253, 231, 36, 255]);
    }

    #[test]
    fn test_sample_interpolates_between_stops() {
        let cmap = Colormap::from_stops(vec![[0.0, 0.0, 0.0], [1.0, 0.5, 0.0]]).unwrap();
        let mid = cmap.sample(0.5);
        assert!((mid[0] - 0.5).abs() < 1e-6);
        assert!((mid[1] - 0.25).abs() < 1e-6);
        assert_eq!(cmap.sample(2.0), [1.0, 0.5, 0.0]);
        assert_eq!(cmap.sample(f32::NAN), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_invalid_stops() {
        assert!(Colormap::from_stops(vec![[0.0; 3]]).is_err());
        assert!(Colormap::from_stops(vec![[0.0; 3], [1.5, 0.0, 0.0]]).is_err());
    }

    #[test]
    fn test_mapper_clips_at_both_ends() {
        let mapper = ColorMapper::default();
        assert_eq!(mapper.color_for(0.0), mapper.color_for(-3.0));
        assert_eq!(mapper.color_for(12.0), mapper.color_for(100.0));
        assert_ne!(mapper.color_for(0.0), mapper.color_for(12.0));
    }

    #[test]
    fn test_map_one_color_per_vertex() {
        let dense = DenseDisplacementField::from_vec(vec![[0.0; 3], [12.0, 0.0, 0.0], [0.0; 3]]);
        let colors = ColorMapper::default().map(&dense);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], colors[2]);
        assert_eq!(colors[1], [253, 231, 36, 255]);
        assert!(colors.iter().all(|c| c[3] == 255));
    }
}
