//! The consuming side of a stream.

use core::fmt;

use crate::stream::{Step, Stream};
use crate::types::Fault;

/// Pulls a stream, driving the engine.
///
/// Serial parts execute inline on the consumer's thread; the first
/// parallel alternation encountered forks workers behind the scenes. The
/// iterator yields `Err` at most once — after the failing region's
/// workers have all been joined — and is fused from then on.
pub fn pull<T: Send + 'static>(stream: Stream<T>) -> Drain<T> {
    Drain { next: Some(stream) }
}

/// Iterator over the values of a pulled stream.
pub struct Drain<T> {
    next: Option<Stream<T>>,
}

impl<T: Send + 'static> Iterator for Drain<T> {
    type Item = Result<T, Fault>;

    fn next(&mut self) -> Option<Self::Item> {
        let stream = self.next.take()?;
        match stream.step(None) {
            Ok(Step::Stop) => None,
            Ok(Step::Yield { value, tail, .. }) => {
                self.next = tail;
                Some(Ok(value))
            }
            Err(fault) => Some(Err(fault)),
        }
    }
}

impl<T: Send + 'static> std::iter::FusedIterator for Drain<T> {}

impl<T> fmt::Debug for Drain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drain")
            .field("exhausted", &self.next.is_none())
            .finish()
    }
}
