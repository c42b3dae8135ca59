//! One-shot retirement notification attached to a pooled instance.

/// Holds the token delivered when an instance leaves the active state.
///
/// An armed observer yields its token exactly once: [`LifecycleObserver::fire`]
/// takes the token out, so a second deactivation (or a stale observer carried
/// into the next activation) has nothing left to deliver.
#[derive(Clone, Debug)]
pub struct LifecycleObserver<O> {
    token: Option<O>,
}

impl<O> Default for LifecycleObserver<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> LifecycleObserver<O> {
    /// Creates a disarmed observer.
    #[must_use]
    pub const fn new() -> Self {
        Self { token: None }
    }

    /// Arms the observer, returning any token it displaced.
    pub fn arm(&mut self, token: O) -> Option<O> {
        self.token.replace(token)
    }

    /// Reports whether a token is waiting to be delivered.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.token.is_some()
    }

    /// Delivers the armed token, leaving the observer disarmed.
    pub fn fire(&mut self) -> Option<O> {
        self.token.take()
    }

    /// Drops the armed token without delivering it.
    pub fn disarm(&mut self) -> Option<O> {
        self.token.take()
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleObserver;

    #[test]
    fn fires_once_per_arming() {
        let mut observer = LifecycleObserver::new();
        assert_eq!(observer.arm(7_u32), None);
        assert!(observer.is_armed());

        assert_eq!(observer.fire(), Some(7));
        assert_eq!(observer.fire(), None);
        assert!(!observer.is_armed());
    }

    #[test]
    fn disarmed_observer_never_fires() {
        let mut observer = LifecycleObserver::new();
        let _ = observer.arm(3_u32);
        assert_eq!(observer.disarm(), Some(3));
        assert_eq!(observer.fire(), None);
    }

    #[test]
    fn rearming_returns_displaced_token() {
        let mut observer = LifecycleObserver::new();
        let _ = observer.arm(1_u32);
        assert_eq!(observer.arm(2), Some(1));
        assert_eq!(observer.fire(), Some(2));
    }
}
