//! LIFO scope stacks

use std::fmt;

use crate::error::{BuildError, BuildResult};

/// The three independent scope stacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackKind {
    Locations,
    Workplanes,
    Builders,
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StackKind::Locations => "Locations",
            StackKind::Workplanes => "Workplanes",
            StackKind::Builders => "Builders",
        };
        f.write_str(name)
    }
}

/// Identifies one pushed frame, so exits can be checked against the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl fmt::Display for FrameToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A stack of frames that may only be popped in reverse push order
#[derive(Debug)]
pub(crate) struct ScopeStack<T> {
    kind: StackKind,
    frames: Vec<(FrameToken, T)>,
    next: u64,
}

impl<T> ScopeStack<T> {
    pub fn new(kind: StackKind) -> Self {
        Self {
            kind,
            frames: Vec::new(),
            next: 0,
        }
    }

    pub fn push(&mut self, value: T) -> FrameToken {
        let token = FrameToken(self.next);
        self.next += 1;
        self.frames.push((token, value));
        token
    }

    /// Check that `token` identifies the top frame
    pub fn check_top(&self, token: FrameToken) -> BuildResult<()> {
        match self.frames.last() {
            None => Err(BuildError::StackUnderflow(self.kind)),
            Some((top, _)) if *top != token => Err(BuildError::OutOfOrderExit {
                stack: self.kind,
                expected: *top,
                found: token,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Pop the top frame, which must be the one identified by `token`
    pub fn pop(&mut self, token: FrameToken) -> BuildResult<T> {
        self.check_top(token)?;
        self.frames
            .pop()
            .map(|(_, value)| value)
            .ok_or(BuildError::StackUnderflow(self.kind))
    }

    /// Remove a frame wherever it is; used when unwinding after a failure
    pub fn remove(&mut self, token: FrameToken) -> Option<T> {
        let index = self.frames.iter().position(|(t, _)| *t == token)?;
        Some(self.frames.remove(index).1)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<&T> {
        self.frames.last().map(|(_, value)| value)
    }

    /// Frames from the bottom (outermost) to the top
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.frames.iter().map(|(_, value)| value)
    }

    /// Frames at depth `base` and above, outermost first
    pub fn values_from(&self, base: usize) -> impl Iterator<Item = &T> {
        self.frames.iter().skip(base).map(|(_, value)| value)
    }
}

/// Combine frames outermost first: the outer frame varies slowest
///
/// The outermost frame's values are taken as they are; `identity` is only
/// returned when there are no frames at all.
pub(crate) fn cross_product<'a, T, I>(frames: I, identity: T, compose: impl Fn(&T, &T) -> T) -> Vec<T>
where
    T: Clone + 'a,
    I: IntoIterator<Item = &'a Vec<T>>,
{
    let mut frames = frames.into_iter();
    let Some(outermost) = frames.next() else {
        return vec![identity];
    };
    let mut acc = outermost.clone();
    for frame in frames {
        acc = acc
            .iter()
            .flat_map(|outer| frame.iter().map(|inner| compose(outer, inner)))
            .collect();
    }
    acc
}
