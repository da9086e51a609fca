use crate::db::models::Severity;
use crate::oracle::Detection;

/// A detection counts as "large" when its box covers more than 2% of the frame.
const LARGE_AREA_FRACTION: f64 = 0.02;

/// Detection count above which a report is serious regardless of box sizes.
const SERIOUS_COUNT: usize = 3;

/// Classify a set of detections into a severity label and a count.
///
/// Pure and total: no detections means (SAFE, 0), and a zero image area
/// (malformed oracle output) is treated as "no large detections" rather
/// than dividing by zero. Severity and count are frozen onto the post at
/// creation time and never recomputed.
pub fn classify(detections: &[Detection], image_width: u32, image_height: u32) -> (Severity, usize) {
    let count = detections.len();
    if count == 0 {
        return (Severity::Safe, 0);
    }

    let image_area = f64::from(image_width) * f64::from(image_height);
    let serious = image_area > 0.0
        && detections
            .iter()
            .any(|d| (d.width * d.height) / image_area > LARGE_AREA_FRACTION);

    if count > SERIOUS_COUNT || serious {
        (Severity::Serious, count)
    } else {
        (Severity::NotSerious, count)
    }
}
