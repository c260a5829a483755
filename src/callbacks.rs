//! Handlers for incoming messages.
//!
//! There is one slot per [`Category`]. Attaching replaces whatever the slot
//! held, detaching empties it. A message with an empty slot is dropped.

extern crate alloc;

use alloc::boxed::Box;
use embedded_io::Write;

use crate::encoder::Encoder;
use crate::pins::PinTable;
use crate::protocol::{
    DIGITAL_MESSAGE, PinMode, REPORT_ANALOG, REPORT_DIGITAL, SET_DIGITAL_PIN_VALUE, SET_PIN_MODE,
    START_SYSEX, STRING_DATA, SYSTEM_RESET,
};

/// What a handler gets to work with besides its arguments: a way to answer
/// on the transport and the pin table.
pub struct Context<'a, W: Write, const PINS: usize> {
    pub reply: Encoder<'a, W>,
    pub pins: &'a mut PinTable<PINS>,
}

pub type PinValueFn<W, const PINS: usize> = dyn FnMut(&mut Context<'_, W, PINS>, u8, u16);
pub type PinModeFn<W, const PINS: usize> = dyn FnMut(&mut Context<'_, W, PINS>, u8, PinMode);
pub type SystemResetFn<W, const PINS: usize> = dyn FnMut(&mut Context<'_, W, PINS>);
pub type StringFn<W, const PINS: usize> = dyn FnMut(&mut Context<'_, W, PINS>, &str);
pub type SysexFn<W, const PINS: usize> = dyn FnMut(&mut Context<'_, W, PINS>, u8, &[u8]);
pub type DelayTaskFn<W, const PINS: usize> = dyn FnMut(&mut Context<'_, W, PINS>, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Digital port write, `(port, value)`
    DigitalMessage,
    /// Analog reporting toggle, `(pin, enable)`
    ReportAnalog,
    /// Digital reporting toggle, `(port, enable)`
    ReportDigital,
    /// Fired after the pin table took a new mode, `(pin, mode)`
    SetPinMode,
    /// Single pin write, `(pin, value)`
    SetDigitalPinValue,
    SystemReset,
    StringData,
    /// Every sysex message not handled internally
    Sysex,
    DelayTask,
}

impl Category {
    /// Slot addressed by a wire command value.
    pub fn from_command(command: u8) -> Option<Category> {
        match command {
            DIGITAL_MESSAGE => Some(Category::DigitalMessage),
            REPORT_ANALOG => Some(Category::ReportAnalog),
            REPORT_DIGITAL => Some(Category::ReportDigital),
            SET_PIN_MODE => Some(Category::SetPinMode),
            SET_DIGITAL_PIN_VALUE => Some(Category::SetDigitalPinValue),
            SYSTEM_RESET => Some(Category::SystemReset),
            STRING_DATA => Some(Category::StringData),
            START_SYSEX => Some(Category::Sysex),
            _ => None,
        }
    }
}

pub enum Callback<W: Write, const PINS: usize> {
    DigitalMessage(Box<PinValueFn<W, PINS>>),
    ReportAnalog(Box<PinValueFn<W, PINS>>),
    ReportDigital(Box<PinValueFn<W, PINS>>),
    SetPinMode(Box<PinModeFn<W, PINS>>),
    SetDigitalPinValue(Box<PinValueFn<W, PINS>>),
    SystemReset(Box<SystemResetFn<W, PINS>>),
    StringData(Box<StringFn<W, PINS>>),
    Sysex(Box<SysexFn<W, PINS>>),
    DelayTask(Box<DelayTaskFn<W, PINS>>),
}

impl<W: Write, const PINS: usize> Callback<W, PINS> {
    pub fn digital_message<F>(f: F) -> Self
    where
        F: FnMut(&mut Context<'_, W, PINS>, u8, u16) + 'static,
    {
        Callback::DigitalMessage(Box::new(f))
    }

    pub fn report_analog<F>(f: F) -> Self
    where
        F: FnMut(&mut Context<'_, W, PINS>, u8, u16) + 'static,
    {
        Callback::ReportAnalog(Box::new(f))
    }

    pub fn report_digital<F>(f: F) -> Self
    where
        F: FnMut(&mut Context<'_, W, PINS>, u8, u16) + 'static,
    {
        Callback::ReportDigital(Box::new(f))
    }

    pub fn set_pin_mode<F>(f: F) -> Self
    where
        F: FnMut(&mut Context<'_, W, PINS>, u8, PinMode) + 'static,
    {
        Callback::SetPinMode(Box::new(f))
    }

    pub fn set_digital_pin_value<F>(f: F) -> Self
    where
        F: FnMut(&mut Context<'_, W, PINS>, u8, u16) + 'static,
    {
        Callback::SetDigitalPinValue(Box::new(f))
    }

    pub fn system_reset<F>(f: F) -> Self
    where
        F: FnMut(&mut Context<'_, W, PINS>) + 'static,
    {
        Callback::SystemReset(Box::new(f))
    }

    pub fn string_data<F>(f: F) -> Self
    where
        F: FnMut(&mut Context<'_, W, PINS>, &str) + 'static,
    {
        Callback::StringData(Box::new(f))
    }

    pub fn sysex<F>(f: F) -> Self
    where
        F: FnMut(&mut Context<'_, W, PINS>, u8, &[u8]) + 'static,
    {
        Callback::Sysex(Box::new(f))
    }

    pub fn delay_task<F>(f: F) -> Self
    where
        F: FnMut(&mut Context<'_, W, PINS>, u32) + 'static,
    {
        Callback::DelayTask(Box::new(f))
    }

    pub fn category(&self) -> Category {
        match self {
            Callback::DigitalMessage(_) => Category::DigitalMessage,
            Callback::ReportAnalog(_) => Category::ReportAnalog,
            Callback::ReportDigital(_) => Category::ReportDigital,
            Callback::SetPinMode(_) => Category::SetPinMode,
            Callback::SetDigitalPinValue(_) => Category::SetDigitalPinValue,
            Callback::SystemReset(_) => Category::SystemReset,
            Callback::StringData(_) => Category::StringData,
            Callback::Sysex(_) => Category::Sysex,
            Callback::DelayTask(_) => Category::DelayTask,
        }
    }
}

pub struct CallbackRegistry<W: Write, const PINS: usize> {
    pub(crate) digital_message: Option<Box<PinValueFn<W, PINS>>>,
    pub(crate) report_analog: Option<Box<PinValueFn<W, PINS>>>,
    pub(crate) report_digital: Option<Box<PinValueFn<W, PINS>>>,
    pub(crate) set_pin_mode: Option<Box<PinModeFn<W, PINS>>>,
    pub(crate) set_digital_pin_value: Option<Box<PinValueFn<W, PINS>>>,
    pub(crate) system_reset: Option<Box<SystemResetFn<W, PINS>>>,
    pub(crate) string_data: Option<Box<StringFn<W, PINS>>>,
    pub(crate) sysex: Option<Box<SysexFn<W, PINS>>>,
    pub(crate) delay_task: Option<Box<DelayTaskFn<W, PINS>>>,
}

impl<W: Write, const PINS: usize> Default for CallbackRegistry<W, PINS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write, const PINS: usize> CallbackRegistry<W, PINS> {
    pub fn new() -> Self {
        CallbackRegistry {
            digital_message: None,
            report_analog: None,
            report_digital: None,
            set_pin_mode: None,
            set_digital_pin_value: None,
            system_reset: None,
            string_data: None,
            sysex: None,
            delay_task: None,
        }
    }

    pub fn attach(&mut self, callback: Callback<W, PINS>) {
        log::trace!("attach {:?}", callback.category());
        match callback {
            Callback::DigitalMessage(f) => self.digital_message = Some(f),
            Callback::ReportAnalog(f) => self.report_analog = Some(f),
            Callback::ReportDigital(f) => self.report_digital = Some(f),
            Callback::SetPinMode(f) => self.set_pin_mode = Some(f),
            Callback::SetDigitalPinValue(f) => self.set_digital_pin_value = Some(f),
            Callback::SystemReset(f) => self.system_reset = Some(f),
            Callback::StringData(f) => self.string_data = Some(f),
            Callback::Sysex(f) => self.sysex = Some(f),
            Callback::DelayTask(f) => self.delay_task = Some(f),
        }
    }

    pub fn detach(&mut self, category: Category) {
        match category {
            Category::DigitalMessage => self.digital_message = None,
            Category::ReportAnalog => self.report_analog = None,
            Category::ReportDigital => self.report_digital = None,
            Category::SetPinMode => self.set_pin_mode = None,
            Category::SetDigitalPinValue => self.set_digital_pin_value = None,
            Category::SystemReset => self.system_reset = None,
            Category::StringData => self.string_data = None,
            Category::Sysex => self.sysex = None,
            Category::DelayTask => self.delay_task = None,
        }
    }

    pub fn is_attached(&self, category: Category) -> bool {
        match category {
            Category::DigitalMessage => self.digital_message.is_some(),
            Category::ReportAnalog => self.report_analog.is_some(),
            Category::ReportDigital => self.report_digital.is_some(),
            Category::SetPinMode => self.set_pin_mode.is_some(),
            Category::SetDigitalPinValue => self.set_digital_pin_value.is_some(),
            Category::SystemReset => self.system_reset.is_some(),
            Category::StringData => self.string_data.is_some(),
            Category::Sysex => self.sysex.is_some(),
            Category::DelayTask => self.delay_task.is_some(),
        }
    }
}
