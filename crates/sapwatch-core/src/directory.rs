//! Session directory: the set of sessions currently announced.
//!
//! Sessions are keyed by `(origin, msg_id_hash)`, which RFC 2974 makes
//! unique per announcement lifetime. A deletion packet for the same key
//! retires the session.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::SessionSummary;
use crate::protocols::sap::SapPacket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionKey {
    pub origin: Ipv4Addr,
    pub msg_id_hash: u16,
}

impl SessionKey {
    pub fn of(packet: &SapPacket) -> Self {
        Self {
            origin: packet.origin_address,
            msg_id_hash: packet.msg_id_hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub payload_mime_type: String,
    pub payload: Vec<u8>,
    pub announcements: u64,
    pub first_seen: Option<f64>,
    pub last_seen: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryEvent {
    Announced,
    Refreshed,
    Withdrawn,
    UnknownWithdrawal,
}

#[derive(Debug, Default)]
pub struct SessionDirectory {
    sessions: BTreeMap<SessionKey, SessionEntry>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, packet: &SapPacket, ts: Option<f64>) -> DirectoryEvent {
        let key = SessionKey::of(packet);
        if packet.is_deletion() {
            return match self.sessions.remove(&key) {
                Some(_) => DirectoryEvent::Withdrawn,
                None => DirectoryEvent::UnknownWithdrawal,
            };
        }

        match self.sessions.get_mut(&key) {
            Some(entry) => {
                entry.announcements += 1;
                entry.payload_mime_type.clone_from(&packet.payload_mime_type);
                entry.payload.clone_from(&packet.payload);
                if ts.is_some() {
                    entry.last_seen = ts;
                }
                DirectoryEvent::Refreshed
            }
            None => {
                self.sessions.insert(
                    key,
                    SessionEntry {
                        payload_mime_type: packet.payload_mime_type.clone(),
                        payload: packet.payload.clone(),
                        announcements: 1,
                        first_seen: ts,
                        last_seen: ts,
                    },
                );
                DirectoryEvent::Announced
            }
        }
    }

    pub fn get(&self, key: &SessionKey) -> Option<&SessionEntry> {
        self.sessions.get(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Active sessions ordered by origin, then hash.
    pub fn sessions(&self) -> impl Iterator<Item = (&SessionKey, &SessionEntry)> {
        self.sessions.iter()
    }

    pub(crate) fn summaries(
        &self,
        ts_format: impl Fn(Option<f64>) -> Option<String>,
    ) -> Vec<SessionSummary> {
        self.sessions
            .iter()
            .map(|(key, entry)| SessionSummary {
                origin: key.origin.to_string(),
                msg_id_hash: format!("{:04x}", key.msg_id_hash),
                payload_mime_type: entry.payload_mime_type.clone(),
                announcements: entry.announcements,
                first_seen: ts_format(entry.first_seen),
                last_seen: ts_format(entry.last_seen),
            })
            .collect()
    }
}
