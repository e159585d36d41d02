//! Test doubles that record what a driver does and in which order.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use embedded_hal_1::{
    delay::DelayNs,
    i2c::{ErrorKind, ErrorType, I2c, Operation},
};

/// Delay that returns immediately and remembers every requested duration.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub waits_ns: Vec<u64>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ns.push(ns as u64);
    }

    fn delay_us(&mut self, us: u32) {
        self.waits_ns.push(us as u64 * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ns.push(ms as u64 * 1_000_000);
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        DelayNs::delay_ns(self, ns);
    }

    async fn delay_us(&mut self, us: u32) {
        DelayNs::delay_us(self, us);
    }

    async fn delay_ms(&mut self, ms: u32) {
        DelayNs::delay_ms(self, ms);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Write(u8, Vec<u8>),
    Read(u8, usize),
    Wait(u64),
}

/// Shared, ordered record of bus transfers and waits.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Step>>>);

impl Journal {
    pub fn steps(&self) -> Vec<Step> {
        self.0.borrow().clone()
    }

    fn push(&self, step: Step) {
        self.0.borrow_mut().push(step);
    }
}

/// I²C bus answering reads from a queue of canned responses, logging every
/// transfer into a [`Journal`].
#[derive(Debug)]
pub struct JournalBus {
    journal: Journal,
    responses: VecDeque<Vec<u8>>,
}

impl JournalBus {
    pub fn new(journal: Journal, responses: impl IntoIterator<Item = Vec<u8>>) -> Self {
        JournalBus {
            journal,
            responses: responses.into_iter().collect(),
        }
    }
}

impl ErrorType for JournalBus {
    type Error = ErrorKind;
}

impl I2c for JournalBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => self.journal.push(Step::Write(address, bytes.to_vec())),
                Operation::Read(buf) => {
                    let response = self.responses.pop_front().ok_or(ErrorKind::Other)?;
                    buf.copy_from_slice(&response);
                    self.journal.push(Step::Read(address, buf.len()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::i2c::I2c for JournalBus {
    async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        I2c::transaction(self, address, operations)
    }
}

/// Delay logging into the same [`Journal`] as a [`JournalBus`].
#[derive(Debug)]
pub struct JournalDelay(pub Journal);

impl DelayNs for JournalDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.push(Step::Wait(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        self.0.push(Step::Wait(us as u64 * 1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.push(Step::Wait(ms as u64 * 1_000_000));
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for JournalDelay {
    async fn delay_ns(&mut self, ns: u32) {
        DelayNs::delay_ns(self, ns);
    }

    async fn delay_us(&mut self, us: u32) {
        DelayNs::delay_us(self, us);
    }

    async fn delay_ms(&mut self, ms: u32) {
        DelayNs::delay_ms(self, ms);
    }
}
