/// Segmentation estimate for one outbound message.
///
/// `billable_units` is this system's accounting figure; carriers may split differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Segmentation {
    pub segments_per_recipient: u32,
    pub billable_units: u32,
}

impl Segmentation {
    pub fn is_empty(self) -> bool {
        self.billable_units == 0
    }
}

/// Split `text` into carrier segments.
///
/// Length is counted in Unicode scalar values. A non-positive `max_length`, blank text or
/// zero recipients yield an empty [`Segmentation`].
pub fn segment(text: &str, max_length: i64, recipient_count: usize) -> Segmentation {
    if max_length <= 0 || text.is_empty() || recipient_count == 0 {
        return Segmentation::default();
    }
    let chars = text.chars().count() as u64;
    let segments = chars.div_ceil(max_length as u64);
    let segments = u32::try_from(segments).unwrap_or(u32::MAX);
    let recipients = u32::try_from(recipient_count).unwrap_or(u32::MAX);
    Segmentation {
        segments_per_recipient: segments,
        billable_units: segments.saturating_mul(recipients),
    }
}
