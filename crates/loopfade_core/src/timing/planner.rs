//! Fade window and truncation planning.

/// Padding added after the last audible sample to absorb encoder flush latency.
pub const TRUNCATION_PAD_SECS: f64 = 0.5;

/// Fade and truncation timestamps for one track, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingPlan {
    /// Length of the looped material before the fade delay.
    pub main_length: f64,
    /// `main_length + fade_delay`.
    pub fade_start: f64,
    /// `fade_start + fade_duration`.
    pub fade_end: f64,
    /// Length of the linear fade.
    pub fade_duration: f64,
    /// False when there are no loops or the fade has zero length.
    pub apply_fade: bool,
}

impl TimingPlan {
    /// Plan the fade for a track.
    pub fn new(main_length: f64, fade_delay: f64, fade_duration: f64, loop_count: u32) -> Self {
        let fade_start = main_length + fade_delay;
        Self {
            main_length,
            fade_start,
            fade_end: fade_start + fade_duration,
            fade_duration,
            apply_fade: loop_count != 0 && fade_duration != 0.0,
        }
    }

    /// Point at which the output stream is cut.
    ///
    /// With a fade this is just past the fade end; without one the
    /// stream is cut just past the main length.
    pub fn truncate_at(&self) -> f64 {
        if self.apply_fade {
            self.fade_end + TRUNCATION_PAD_SECS
        } else {
            self.main_length + TRUNCATION_PAD_SECS
        }
    }

    /// Encoder fade filter (`afade=t=out:st=..:d=..`), if a fade applies.
    pub fn fade_filter(&self) -> Option<String> {
        self.apply_fade.then(|| {
            format!(
                "afade=t=out:st={}:d={}",
                format_seconds(self.fade_start),
                format_seconds(self.fade_duration)
            )
        })
    }
}

/// Render seconds with at most six decimals and no trailing zeros.
///
/// The filter syntax treats `:` as a delimiter, so plain seconds are
/// used rather than `MM:SS`.
pub fn format_seconds(secs: f64) -> String {
    let text = format!("{:.6}", secs);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::{tracker_main_length, OrgVersion, TrackHeader};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn fade_window_follows_main_length() {
        let plan = TimingPlan::new(24.0, 2.0, 8.0, 1);
        assert!(plan.apply_fade);
        assert!(approx(plan.fade_start, 26.0));
        assert!(approx(plan.fade_end, 34.0));
        assert!(approx(plan.truncate_at(), 34.5));
        assert_eq!(plan.fade_filter().as_deref(), Some("afade=t=out:st=26:d=8"));
    }

    #[test]
    fn no_loops_or_no_fade_truncates_at_main_length() {
        for plan in [
            TimingPlan::new(24.0, 2.0, 8.0, 0),
            TimingPlan::new(24.0, 2.0, 0.0, 3),
        ] {
            assert!(!plan.apply_fade);
            assert!(approx(plan.truncate_at(), 24.5));
            assert_eq!(plan.fade_filter(), None);
        }
    }

    #[test]
    fn fade_start_increases_with_loop_count() {
        let header = TrackHeader {
            version: OrgVersion::V3,
            tick_duration_ms: 80,
            loop_start_tick: 64,
            loop_end_tick: 512,
        };
        let mut previous = f64::MIN;
        for loops in 1..6 {
            let plan = TimingPlan::new(tracker_main_length(&header, loops), 2.0, 8.0, loops);
            assert!(plan.apply_fade);
            assert!(plan.fade_start > previous);
            previous = plan.fade_start;
        }
    }

    #[test]
    fn tracker_end_to_end() {
        let header = TrackHeader {
            version: OrgVersion::V2,
            tick_duration_ms: 120,
            loop_start_tick: 1000,
            loop_end_tick: 5000,
        };
        let plan = TimingPlan::new(tracker_main_length(&header, 1), 2.0, 8.0, 1);
        assert!(approx(plan.main_length, 1080.0));
        assert!(approx(plan.fade_start, 1082.0));
        assert!(approx(plan.fade_end, 1090.0));
        assert!(approx(plan.truncate_at(), 1090.5));
    }

    #[test]
    fn seconds_are_trimmed() {
        assert_eq!(format_seconds(34.5), "34.5");
        assert_eq!(format_seconds(26.0), "26");
        assert_eq!(format_seconds(24.0000012), "24.000001");
        assert_eq!(format_seconds(0.0), "0");
        assert_eq!(format_seconds(26.000000000000004), "26");
    }
}
