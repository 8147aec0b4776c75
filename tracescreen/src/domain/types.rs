//! Domain types providing compile-time safety and self-documentation

use std::fmt;

/// Process ID
///
/// Used both for the traced target and for the tracer child. Kept signed to
/// match `pid_t` so it can be handed to `kill(2)` without conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub i32);

impl Pid {
    /// Raw value as expected by libc calls.
    #[must_use]
    pub fn as_raw(self) -> libc::pid_t {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

impl From<i32> for Pid {
    fn from(pid: i32) -> Self {
        Pid(pid)
    }
}

impl From<Pid> for i32 {
    fn from(pid: Pid) -> Self {
        pid.0
    }
}

impl TryFrom<u32> for Pid {
    type Error = std::num::TryFromIntError;

    fn try_from(pid: u32) -> Result<Self, Self::Error> {
        i32::try_from(pid).map(Pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_display() {
        assert_eq!(Pid(1234).to_string(), "PID:1234");
    }

    #[test]
    fn test_pid_from_child_id() {
        assert_eq!(Pid::try_from(42_u32).unwrap(), Pid(42));
        assert!(Pid::try_from(u32::MAX).is_err());
    }
}
