//! Mock collaborators shared by the integration tests

#![allow(dead_code)]

use heapless::{String, Vec};
use sensorlink::cloud::{Clock, DeviceMeta, Event, EventSink, MessageType, Session};
use sensorlink::sensor::{
    Climate, ClusterId, DisplayLine, NetworkAddress, Platform, SimpleDescriptor,
};
use sensorlink::transport::{Read, Write};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MockError {
    Refused,
}

/// Serial port capturing everything written to it
#[derive(Debug, Default)]
pub struct MockSerial {
    pub written: Vec<u8, 1024>,
    pub fail_writes: bool,
    /// Accept at most this many bytes per write call, to exercise short writes
    pub max_chunk: Option<usize>,
}

impl MockSerial {
    pub fn text(&self) -> &str {
        core::str::from_utf8(&self.written).unwrap()
    }
}

impl Write for MockSerial {
    type Error = MockError;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_writes {
            return Err(MockError::Refused);
        }
        let len = self.max_chunk.map_or(buf.len(), |max| buf.len().min(max));
        self.written
            .extend_from_slice(&buf[..len])
            .map_err(|_| MockError::Refused)?;
        Ok(len)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(MockError::Refused);
        }
        Ok(())
    }
}

/// A data request captured by the mock radio
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SentMessage {
    pub destination: NetworkAddress,
    pub cluster: ClusterId,
    pub payload: Vec<u8, 16>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TimerCall {
    Start(u32),
    Stop,
}

/// Board and network stack stand-in
#[derive(Debug, Default)]
pub struct MockPlatform {
    pub registered: Option<SimpleDescriptor>,
    pub climate: Climate,
    pub sensor_fails: bool,
    pub radio_fails: bool,
    pub register_fails: bool,
    pub display: Vec<(DisplayLine, String<20>), 16>,
    pub sent: Vec<SentMessage, 16>,
    pub timer: Vec<TimerCall, 32>,
    pub serial: MockSerial,
}

impl MockPlatform {
    pub fn with_climate(temperature: u8, humidity: u8) -> Self {
        Self {
            climate: Climate {
                temperature,
                humidity,
            },
            ..Self::default()
        }
    }

    pub fn last_timer(&self) -> Option<TimerCall> {
        self.timer.last().copied()
    }
}

impl Platform for MockPlatform {
    type Error = MockError;
    type Serial = MockSerial;

    fn register_endpoint(&mut self, descriptor: &SimpleDescriptor) -> Result<(), Self::Error> {
        if self.register_fails {
            return Err(MockError::Refused);
        }
        self.registered = Some(*descriptor);
        Ok(())
    }

    fn read_sensor(&mut self) -> Result<Climate, Self::Error> {
        if self.sensor_fails {
            return Err(MockError::Refused);
        }
        Ok(self.climate)
    }

    fn display(&mut self, line: DisplayLine, text: &str) {
        self.display
            .push((line, String::try_from(text).unwrap()))
            .unwrap();
    }

    fn serial(&mut self) -> &mut Self::Serial {
        &mut self.serial
    }

    fn data_request(
        &mut self,
        destination: &NetworkAddress,
        cluster: ClusterId,
        payload: &[u8],
    ) -> Result<(), Self::Error> {
        if self.radio_fails {
            return Err(MockError::Refused);
        }
        self.sent
            .push(SentMessage {
                destination: *destination,
                cluster,
                payload: Vec::from_slice(payload).unwrap(),
            })
            .unwrap();
        Ok(())
    }

    fn start_timer(&mut self, timeout_ms: u32) {
        self.timer.push(TimerCall::Start(timeout_ms)).unwrap();
    }

    fn stop_timer(&mut self) {
        self.timer.push(TimerCall::Stop).unwrap();
    }
}

/// UART receive FIFO holding predefined data
pub struct MockUart {
    data: &'static [u8],
    read_pos: usize,
    pub fail: bool,
}

impl MockUart {
    pub fn new(data: &'static [u8]) -> Self {
        Self {
            data,
            read_pos: 0,
            fail: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.read_pos
    }
}

impl Read for MockUart {
    type Error = MockError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail {
            return Err(MockError::Refused);
        }
        let to_read = core::cmp::min(buf.len(), self.remaining());
        buf[..to_read].copy_from_slice(&self.data[self.read_pos..self.read_pos + to_read]);
        self.read_pos += to_read;
        Ok(to_read)
    }
}

/// Clock advancing by a fixed step on every read
pub struct MockClock {
    pub now_ms: u64,
    pub step_ms: u64,
}

impl MockClock {
    pub fn new(step_ms: u64) -> Self {
        Self {
            now_ms: 10_000,
            step_ms,
        }
    }
}

impl Clock for MockClock {
    fn uptime_ms(&mut self) -> u64 {
        self.now_ms += self.step_ms;
        self.now_ms
    }
}

/// An event the mock session raises on a given yield call
#[derive(Debug, Clone, Copy)]
pub enum ScriptedEvent {
    Connected,
    Disconnected,
    Initialized(i32),
    PropertySet(&'static str),
    PropertyGet,
}

/// Cloud session driver stand-in
#[derive(Debug, Default)]
pub struct MockSession {
    pub device_id: i32,
    pub open_fails: bool,
    pub connect_fails: bool,
    pub report_fails: bool,
    pub mqtt_domain: Option<String<64>>,
    pub endpoint: Option<String<64>>,
    pub event_reply: Option<bool>,
    pub opened: bool,
    pub closed: bool,
    pub yields: u32,
    pub last_timeout_ms: u32,
    pub reports: Vec<(MessageType, String<64>), 64>,
    pub responses: Vec<String<128>, 8>,
    pub handler_errors: u32,
    /// (yield number, event) pairs raised during the run
    pub script: Vec<(u32, ScriptedEvent), 8>,
}

impl Session for MockSession {
    type Error = MockError;

    fn set_mqtt_domain(&mut self, domain: &str) -> Result<(), Self::Error> {
        self.mqtt_domain = Some(String::try_from(domain).unwrap());
        Ok(())
    }

    fn set_endpoint(&mut self, endpoint: &str) -> Result<(), Self::Error> {
        self.endpoint = Some(String::try_from(endpoint).unwrap());
        Ok(())
    }

    fn set_event_reply(&mut self, enabled: bool) -> Result<(), Self::Error> {
        self.event_reply = Some(enabled);
        Ok(())
    }

    fn open(&mut self, _meta: &DeviceMeta<'_>) -> Result<i32, Self::Error> {
        if self.open_fails {
            return Err(MockError::Refused);
        }
        self.opened = true;
        Ok(self.device_id)
    }

    fn connect(&mut self, _device_id: i32) -> Result<(), Self::Error> {
        if self.connect_fails {
            return Err(MockError::Refused);
        }
        Ok(())
    }

    fn yield_for(&mut self, timeout_ms: u32, sink: &mut dyn EventSink) {
        self.yields += 1;
        self.last_timeout_ms = timeout_ms;

        let due: Vec<ScriptedEvent, 8> = self
            .script
            .iter()
            .filter(|(at, _)| *at == self.yields)
            .map(|(_, event)| *event)
            .collect();

        for scripted in due {
            let devid = self.device_id;
            let event = match scripted {
                ScriptedEvent::Connected => Event::ConnectSuccess,
                ScriptedEvent::Disconnected => Event::Disconnected,
                ScriptedEvent::Initialized(devid) => Event::InitializeCompleted { devid },
                ScriptedEvent::PropertySet(request) => Event::PropertySet { devid, request },
                ScriptedEvent::PropertyGet => Event::PropertyGet {
                    devid,
                    request: "[]",
                },
            };
            match sink.on_event(&event) {
                Ok(Some(response)) => self.responses.push(response).unwrap(),
                Ok(None) => {}
                Err(_) => self.handler_errors += 1,
            }
        }
    }

    fn report(
        &mut self,
        _device_id: i32,
        kind: MessageType,
        payload: &[u8],
    ) -> Result<i32, Self::Error> {
        if self.report_fails {
            return Err(MockError::Refused);
        }
        let text = core::str::from_utf8(payload).unwrap();
        self.reports
            .push((kind, String::try_from(text).unwrap()))
            .unwrap();
        Ok(self.reports.len() as i32)
    }

    fn close(&mut self, _device_id: i32) -> Result<(), Self::Error> {
        self.closed = true;
        Ok(())
    }
}
