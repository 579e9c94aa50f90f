//! Scripted transport for driver and session tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use uuid::Uuid;

use crate::ble::{CharacteristicHandle, DeviceAddress, Notification, Transport};
use crate::error::TransportError;
use crate::protocol::RawPayload;

/// A [`Transport`] that answers from a script and records every call.
///
/// Notifications queued with [`notify_after_write`](Self::notify_after_write)
/// become visible once a write succeeds. With nothing queued,
/// `next_notification` never completes, so tests run on a paused clock.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    pub calls: Vec<String>,
    reject_connect: bool,
    hang_on_connect: bool,
    stall_after_link: bool,
    pub linked: bool,
    reject_writes: bool,
    close_after_write: bool,
    reads: HashMap<u16, RawPayload>,
    uuid_reads: HashMap<Uuid, RawPayload>,
    after_write: Vec<Notification>,
    pending: VecDeque<Notification>,
    closed: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_connect(mut self) -> Self {
        self.reject_connect = true;
        self
    }

    pub fn hanging_on_connect(mut self) -> Self {
        self.hang_on_connect = true;
        self
    }

    /// Bring the link up, then never finish connecting.
    pub fn stalling_after_link(mut self) -> Self {
        self.stall_after_link = true;
        self
    }

    pub fn rejecting_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    pub fn closing_after_write(mut self) -> Self {
        self.close_after_write = true;
        self
    }

    pub fn with_read(mut self, target: CharacteristicHandle, hex: &str) -> Self {
        let payload = RawPayload::from_hex_str(hex).expect("valid hex in test script");
        self.reads.insert(target.handle(), payload);
        self
    }

    pub fn with_text(mut self, uuid: Uuid, text: &str) -> Self {
        self.uuid_reads
            .insert(uuid, RawPayload::from(text.as_bytes().to_vec()));
        self
    }

    pub fn notify_after_write(mut self, handle: u16, data: &[u8]) -> Self {
        self.after_write.push(Notification {
            handle: Some(handle),
            uuid: None,
            payload: RawPayload::from(data.to_vec()),
        });
        self
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self, address: &DeviceAddress) -> Result<(), TransportError> {
        self.calls.push("connect".to_string());
        if self.hang_on_connect {
            std::future::pending::<()>().await;
        }
        if self.reject_connect {
            return Err(TransportError::DeviceNotFound {
                address: address.to_string(),
            });
        }
        self.linked = true;
        if self.stall_after_link {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn read_characteristic(
        &mut self,
        target: &CharacteristicHandle,
    ) -> Result<RawPayload, TransportError> {
        self.calls.push(format!("read 0x{:04x}", target.handle()));
        match self.reads.get(&target.handle()) {
            Some(payload) => Ok(payload.clone()),
            None => std::future::pending().await,
        }
    }

    async fn read_by_uuid(&mut self, uuid: Uuid) -> Result<RawPayload, TransportError> {
        self.calls.push(format!("read {}", uuid));
        self.uuid_reads
            .get(&uuid)
            .cloned()
            .ok_or_else(|| TransportError::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }

    async fn write_characteristic(
        &mut self,
        target: &CharacteristicHandle,
        data: &[u8],
    ) -> Result<(), TransportError> {
        self.calls
            .push(format!("write 0x{:04x} {}", target.handle(), hex::encode(data)));
        if self.reject_writes {
            return Err(TransportError::Rejected("write not permitted".to_string()));
        }
        self.pending.extend(self.after_write.drain(..));
        self.closed = self.close_after_write;
        Ok(())
    }

    async fn subscribe(&mut self, target: &CharacteristicHandle) -> Result<(), TransportError> {
        self.calls.push(format!("subscribe 0x{:04x}", target.handle()));
        Ok(())
    }

    async fn next_notification(&mut self) -> Option<Notification> {
        if let Some(notification) = self.pending.pop_front() {
            return Some(notification);
        }
        if self.closed {
            return None;
        }
        std::future::pending().await
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.calls.push("disconnect".to_string());
        self.linked = false;
        Ok(())
    }
}
