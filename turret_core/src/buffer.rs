//! Per-angle scan storage owned by one operating cycle.

/// One slot of the angular buffer, as exposed for display and logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleSample {
    pub angle: usize,
    pub distance_cm: f32,
    pub detected: bool,
    pub target: bool,
}

/// Fixed-size distance, detection and target tracks indexed by degree.
///
/// All three tracks always have the same length. The buffer is sized once and
/// reused across cycles through `reset()`.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularBuffer {
    distance: Vec<f32>,
    detected: Vec<bool>,
    target: Vec<bool>,
}

impl AngularBuffer {
    pub fn new(range: usize) -> Self {
        Self {
            distance: vec![0.0; range],
            detected: vec![false; range],
            target: vec![false; range],
        }
    }

    /// Buffer whose detection track is `detected`; distances read 0.
    pub fn from_detected(detected: Vec<bool>) -> Self {
        let n = detected.len();
        Self {
            distance: vec![0.0; n],
            detected,
            target: vec![false; n],
        }
    }

    pub fn reset(&mut self) {
        self.distance.fill(0.0);
        self.detected.fill(false);
        self.target.fill(false);
    }

    pub fn len(&self) -> usize {
        self.detected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detected.is_empty()
    }

    pub fn distance(&self, angle: usize) -> Option<f32> {
        self.distance.get(angle).copied()
    }

    pub fn is_detected(&self, angle: usize) -> bool {
        self.detected.get(angle).copied().unwrap_or(false)
    }

    pub fn is_target(&self, angle: usize) -> bool {
        self.target.get(angle).copied().unwrap_or(false)
    }

    /// Store a reading; returns whether it counts as a detection.
    ///
    /// A later reading at the same angle replaces the earlier one. Angles
    /// outside the buffer are ignored.
    pub fn record(&mut self, angle: usize, distance_cm: f32, threshold_cm: f32) -> bool {
        let Some(slot) = self.distance.get_mut(angle) else {
            return false;
        };
        *slot = distance_cm;
        let hit = distance_cm <= threshold_cm;
        self.detected[angle] = hit;
        hit
    }

    pub fn detected(&self) -> &[bool] {
        &self.detected
    }

    pub fn detected_mut(&mut self) -> &mut [bool] {
        &mut self.detected
    }

    pub(crate) fn clear_targets(&mut self) {
        self.target.fill(false);
    }

    pub(crate) fn mark_target(&mut self, angle: usize) {
        if let Some(t) = self.target.get_mut(angle) {
            *t = true;
        }
    }

    /// Selected firing angles, ascending.
    pub fn targets(&self) -> Vec<usize> {
        self.target
            .iter()
            .enumerate()
            .filter_map(|(i, &t)| t.then_some(i))
            .collect()
    }

    pub fn samples(&self) -> impl Iterator<Item = AngleSample> + '_ {
        (0..self.len()).map(move |angle| AngleSample {
            angle,
            distance_cm: self.distance[angle],
            detected: self.detected[angle],
            target: self.target[angle],
        })
    }
}
