/// Receives the clock state once per frame while audio is playing.
///
/// Called on the render thread in registration order. Implementations must not
/// block or drive the clock themselves.
pub trait ClockObserver {
    /// `elapsed_ms` is the clock position, `delta_ms` the signed advance this
    /// frame with the clock rate already applied.
    fn on_clock_update(&mut self, elapsed_ms: f64, delta_ms: f64);
}
