//! Debug console line editing
//!
//! Bytes typed on the console port are collected until CR or LF and the
//! completed line is echoed back.

use dmlink_hal::UartTx;
use heapless::Vec;

/// Sequence written after an echoed line
pub const LINE_END: &[u8] = b"\r\n";

/// Collects console bytes into lines
///
/// Holds at most `N - 1` bytes; anything typed past that is dropped until
/// the line is terminated.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer<const N: usize> {
    line: Vec<u8, N>,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self { line: Vec::new() }
    }

    /// Feed one byte
    ///
    /// Returns the finished line when `byte` terminates a non-empty line.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8, N>> {
        match byte {
            b'\r' | b'\n' => {
                if self.line.is_empty() {
                    None
                } else {
                    Some(core::mem::take(&mut self.line))
                }
            }
            _ => {
                if self.line.len() + 1 < N {
                    self.line.push(byte).ok();
                }
                None
            }
        }
    }

    /// Bytes collected so far
    pub fn pending(&self) -> &[u8] {
        &self.line
    }

    pub fn clear(&mut self) {
        self.line.clear();
    }
}

/// Write `line` followed by [`LINE_END`]
pub fn echo_line<T: UartTx>(tx: &mut T, line: &[u8]) -> Result<(), T::Error> {
    tx.write_blocking(line)?;
    tx.write_blocking(LINE_END)?;
    tx.flush()
}
