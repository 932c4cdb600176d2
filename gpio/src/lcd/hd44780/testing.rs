//! Recording [HD44780Driver] used by the unit tests of the codec, the display state and the
//! layout engine.

use super::config::BusWidth;
use super::driver::HD44780Driver;
use super::state::FunctionSet;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Synchronize(FunctionSet),
    Command(u8),
    Data(u8),
    Wait(Duration),
    Shutdown,
    Dropped,
}

/// Handle on the events of a [RecordingDriver], usable after the driver was moved or dropped.
#[derive(Clone, Debug, Default)]
pub struct Events(Rc<RefCell<Vec<Event>>>);

impl Events {
    /// Removes and returns every event recorded so far.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn commands(&self) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Command(command) => Some(*command),
                _ => None,
            })
            .collect()
    }

    pub fn data(&self) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Data(data) => Some(*data),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }
}

#[derive(Debug)]
pub struct RecordingDriver {
    width: BusWidth,
    events: Events,
}

impl RecordingDriver {
    pub fn new(width: BusWidth) -> (Self, Events) {
        let events = Events::default();
        let driver = RecordingDriver {
            width,
            events: events.clone(),
        };
        (driver, events)
    }
}

impl HD44780Driver for RecordingDriver {
    fn bus_width(&self) -> BusWidth {
        self.width
    }

    fn synchronize(&mut self, function: FunctionSet) {
        self.events.push(Event::Synchronize(function));
    }

    fn send_command(&mut self, command: u8) {
        self.events.push(Event::Command(command));
    }

    fn send_data(&mut self, data: u8) {
        self.events.push(Event::Data(data));
    }

    fn wait(&mut self, duration: Duration) {
        self.events.push(Event::Wait(duration));
    }

    fn shutdown(&mut self) {
        self.events.push(Event::Shutdown);
    }
}

impl Drop for RecordingDriver {
    fn drop(&mut self) {
        self.events.push(Event::Dropped);
    }
}
