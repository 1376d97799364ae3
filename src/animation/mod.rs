/// Easing curves.
pub mod ease;
/// Slide-to-slide transition frames.
pub mod transition;
