//! Per-tick angle animation.
//!
//! Each animated scalar lives in its own slot of an [`AnimationStepper`] and
//! advances by a fixed increment every tick. There is no time base: one tick
//! is one frame, however long that frame took.
//!
//! The overflow rule is kept exactly as the demos always had it. When
//! `current + increment` reaches 360 the new value is
//! `360 - current + increment`, which is close to, but not the same as, a
//! modulo wrap.

/// Advances one angle by one tick.
///
/// ```
/// use vitrine::animation::step_angle;
///
/// assert_eq!(step_angle(10.0, 0.5), 10.5);
/// assert_eq!(step_angle(359.0, 1.0), 2.0); // 360 - 359 + 1
/// ```
pub fn step_angle(current: f32, increment: f32) -> f32 {
    let next = current + increment;
    if next < 360.0 {
        next
    } else {
        360.0 - current + increment
    }
}

/// An angle in degrees and the amount it moves per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatedAngle {
    pub value: f32,
    pub increment: f32,
}

impl AnimatedAngle {
    pub fn new(value: f32, increment: f32) -> Self {
        Self { value, increment }
    }

    pub fn tick(&mut self) {
        self.value = step_angle(self.value, self.increment);
    }
}

/// Handle to a slot in an [`AnimationStepper`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AngleId(pub(crate) usize);

/// Owns every animated angle of a scene and advances them together.
#[derive(Clone, Debug, Default)]
pub struct AnimationStepper {
    slots: Vec<AnimatedAngle>,
    ticks: u64,
}

impl AnimationStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slot starting at `initial` degrees.
    pub fn add(&mut self, initial: f32, increment: f32) -> AngleId {
        self.slots.push(AnimatedAngle::new(initial, increment));
        AngleId(self.slots.len() - 1)
    }

    /// Advances every slot once. Slots are independent of each other.
    pub fn tick(&mut self) {
        for slot in &mut self.slots {
            slot.tick();
        }
        self.ticks += 1;
    }

    /// Current value of a slot, or `0.0` for a handle from another stepper.
    pub fn value(&self, id: AngleId) -> f32 {
        self.slots.get(id.0).map_or(0.0, |slot| slot.value)
    }

    pub fn get(&self, id: AngleId) -> Option<&AnimatedAngle> {
        self.slots.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_360_adds_increment() {
        assert_eq!(step_angle(0.0, 0.05), 0.05);
        assert_eq!(step_angle(358.5, 1.0), 359.5);
    }

    #[test]
    fn sum_of_exactly_360_uses_legacy_wrap() {
        assert_eq!(step_angle(359.0, 1.0), 2.0);
        assert_eq!(step_angle(350.0, 10.0), 20.0);
    }

    #[test]
    fn sum_just_above_360_uses_legacy_wrap() {
        assert_eq!(step_angle(359.5, 1.0), 1.5);
    }

    #[test]
    fn sum_just_below_360_does_not_wrap() {
        let current = 358.75;
        let next = step_angle(current, 1.0);
        assert_eq!(next, 359.75);
        assert!(next < 360.0);
    }

    #[test]
    fn legacy_wrap_is_not_modulo() {
        // A large increment shows the difference: modulo would give 40.
        assert_eq!(step_angle(300.0, 100.0), 160.0);
    }

    #[test]
    fn negative_increment_runs_below_zero() {
        let mut angle = AnimatedAngle::new(0.0, -0.5);
        angle.tick();
        angle.tick();
        assert_eq!(angle.value, -1.0);
    }

    #[test]
    fn stepper_advances_every_slot_independently() {
        let mut stepper = AnimationStepper::new();
        let a = stepper.add(0.0, 1.0);
        let b = stepper.add(359.0, 1.0);
        let c = stepper.add(5.0, 0.0);

        stepper.tick();

        assert_eq!(stepper.value(a), 1.0);
        assert_eq!(stepper.value(b), 2.0);
        assert_eq!(stepper.value(c), 5.0);
        assert_eq!(stepper.ticks(), 1);
    }

    #[test]
    fn unknown_handle_reads_zero() {
        let stepper = AnimationStepper::new();
        assert_eq!(stepper.value(AngleId(7)), 0.0);
        assert!(stepper.get(AngleId(7)).is_none());
    }
}
