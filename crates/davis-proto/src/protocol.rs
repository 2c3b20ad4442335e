//! The console protocol state machine: wake-up handshake, `GETTIME`,
//! `SETTIME`, `DMPAFT`, and the optional `WRD` station-code query. Every
//! operation is blocking and synchronous, matching the console's own
//! half-duplex behaviour.

use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::{debug, info, warn};

use crate::codec::{self, RECORD_LEN};
use crate::config::ClientConfig;
use crate::crc;
use crate::error::ProtocolError;
use crate::record::MeteoRecord;
use crate::transport::Transport;

/// Number of archive slots packed into one `DMPAFT` page.
const SLOTS_PER_PAGE: usize = 5;
/// Bytes in one `DMPAFT` page body: 1 sequence byte, 5 52-byte record
/// slots, and 4 trailing unused bytes the console pads each page with
/// (265 total; the CRC covers all of it, slots excepted).
const PAGE_BODY_LEN: usize = 265;
/// Bytes in one `DMPAFT` page including its trailing CRC (267 total).
const PAGE_FRAME_LEN: usize = PAGE_BODY_LEN + 2;

/// A Davis-style console reached over some [`Transport`], speaking the
/// wake-up / command / acknowledgement protocol described in the console's
/// serial manual.
pub struct DavisProtocol<T: Transport> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> DavisProtocol<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Wake the console by sending `\n` up to `config.retries` times, until
    /// it replies with `\n\r`.
    pub fn wake_up(&mut self) -> Result<(), ProtocolError> {
        for attempt in 0..self.config.retries {
            self.transport.write(&[b'\n'])?;
            match self.transport.read(2) {
                Ok(bytes) if bytes == [0x0A, 0x0D] => {
                    debug!(attempt, "console woke up");
                    return Ok(());
                }
                Ok(_) | Err(_) => continue,
            }
        }
        Err(ProtocolError::NotResponding {
            retries: self.config.retries,
        })
    }

    /// Send `TEST\n` and confirm the console echoes `\n\rTEST\n\r`. Compared
    /// byte-for-byte against the literal reply, not against a `str`.
    pub fn test_comm(&mut self) -> Result<bool, ProtocolError> {
        self.transport.write(b"TEST\n")?;
        let reply = self.transport.read(8)?;
        Ok(reply == b"\n\rTEST\n\r")
    }

    /// Query the station's hardware code via `WRD`.
    pub fn get_station_code(&mut self) -> Result<u8, ProtocolError> {
        self.transport.write(b"WRD")?;
        self.transport.write(&[0x12, 0x4d])?;
        self.transport.write(&[b'\n'])?;
        self.wait_for_ack()?;
        let reply = self.transport.read(1)?;
        Ok(reply[0])
    }

    /// Read the console's current date-time via `GETTIME`.
    pub fn get_time(&mut self) -> Result<NaiveDateTime, ProtocolError> {
        self.transport.write(b"GETTIME")?;
        self.transport.write(&[b'\n'])?;
        self.wait_for_ack()?;

        let payload = self.transport.read(6)?;
        let crc_bytes = self.transport.read(2)?;
        let crc_rcv = u16::from_be_bytes([crc_bytes[0], crc_bytes[1]]);
        if !crc::verify(&payload, crc_rcv) {
            warn!("GETTIME payload failed its CRC check");
            return Err(ProtocolError::NoTime);
        }

        let second = payload[0];
        let minute = payload[1];
        let hour = payload[2];
        let day = payload[3];
        let month = payload[4];
        let year = 1900 + u32::from(payload[5]);

        chrono::NaiveDate::from_ymd_opt(year as i32, u32::from(month), u32::from(day))
            .and_then(|d| d.and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second)))
            .ok_or(ProtocolError::NoTime)
    }

    /// Push a new date-time to the console via `SETTIME`.
    pub fn set_time(&mut self, when: NaiveDateTime) -> Result<(), ProtocolError> {
        self.transport.write(b"SETTIME")?;
        self.transport.write(&[b'\n'])?;
        self.wait_for_ack()?;

        let payload = [
            when.second() as u8,
            when.minute() as u8,
            when.hour() as u8,
            when.day() as u8,
            when.month() as u8,
            (when.year() - 1900) as u8,
        ];
        let crc_out = crc::checksum(&payload);
        self.transport.write(&payload)?;
        self.transport.write(&crc_out.to_be_bytes())?;
        self.wait_for_ack()?;
        Ok(())
    }

    /// Download every archive record timestamped strictly after `since`,
    /// sorted ascending by timestamp, via `DMPAFT`.
    pub fn get_archive_data(&mut self, since: NaiveDateTime) -> Result<Vec<MeteoRecord>, ProtocolError> {
        self.transport.write(b"DMPAFT")?;
        self.transport.write(&[b'\n'])?;
        self.wait_for_ack()?;

        let date_raw = codec::encode_date(Some((since.year() as u16, since.month() as u8, since.day() as u8)));
        let time_raw = codec::encode_time(since.hour() as u8, since.minute() as u8);
        let mut request = Vec::with_capacity(4);
        request.extend_from_slice(&date_raw.to_le_bytes());
        request.extend_from_slice(&time_raw.to_le_bytes());
        let crc_out = crc::checksum(&request);
        self.transport.write(&request)?;
        self.transport.write(&crc_out.to_be_bytes())?;
        self.wait_for_ack()?;

        let header = self.transport.read(4)?;
        let header_crc_bytes = self.transport.read(2)?;
        let header_crc = u16::from_be_bytes([header_crc_bytes[0], header_crc_bytes[1]]);
        if !crc::verify(&header, header_crc) {
            return Err(ProtocolError::CrcMismatch { operation: "DMPAFT header" });
        }
        let num_pages = u16::from_le_bytes([header[0], header[1]]) as usize;
        let valid_record = u16::from_le_bytes([header[2], header[3]]) as usize;
        info!(num_pages, valid_record, "DMPAFT header received");
        self.transport.write_ack()?;

        let mut records = Vec::new();
        for page_index in 0..num_pages {
            let page = self.transport.read(PAGE_FRAME_LEN)?;
            let body = &page[..PAGE_BODY_LEN];
            let crc_rcv = u16::from_be_bytes([page[PAGE_BODY_LEN], page[PAGE_BODY_LEN + 1]]);
            if !crc::verify(body, crc_rcv) {
                warn!(page_index, "DMPAFT page failed its CRC check, dropping");
                continue;
            }
            self.transport.write_ack()?;

            for slot_index in 0..SLOTS_PER_PAGE {
                if page_index == 0 && slot_index < valid_record {
                    continue;
                }
                let start = 1 + slot_index * RECORD_LEN;
                let mut slot = [0u8; RECORD_LEN];
                slot.copy_from_slice(&body[start..start + RECORD_LEN]);
                if let Some(record) = codec::decode_slot(&slot, &self.config) {
                    if record.timestamp > since {
                        records.push(record);
                    }
                }
            }
        }
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    fn wait_for_ack(&mut self) -> Result<(), ProtocolError> {
        if self.transport.wait_for_ack()? {
            Ok(())
        } else {
            Err(ProtocolError::MissingAck)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, ACK};

    fn config() -> ClientConfig {
        ClientConfig::default()
    }

    #[test]
    fn wake_up_succeeds_on_first_reply() {
        let transport = MockTransport::scripted([0x0A, 0x0D]);
        let mut proto = DavisProtocol::new(transport, config());
        proto.wake_up().unwrap();
    }

    #[test]
    fn wake_up_exhausts_retries() {
        let transport = MockTransport::scripted(std::iter::empty());
        let mut proto = DavisProtocol::new(transport, config());
        let err = proto.wake_up().unwrap_err();
        assert!(matches!(err, ProtocolError::NotResponding { retries: 3 }));
    }

    #[test]
    fn test_comm_round_trip() {
        let transport = MockTransport::scripted(*b"\n\rTEST\n\r");
        let mut proto = DavisProtocol::new(transport, config());
        assert!(proto.test_comm().unwrap());
    }

    #[test]
    fn test_comm_rejects_wrong_reply() {
        let transport = MockTransport::scripted(*b"garbage!");
        let mut proto = DavisProtocol::new(transport, config());
        assert!(!proto.test_comm().unwrap());
    }

    #[test]
    fn get_time_decodes_happy_path() {
        let payload = [30u8, 45, 14, 12, 6, 124];
        let crc = crc::checksum(&payload);
        let mut script = vec![ACK];
        script.extend_from_slice(&payload);
        script.extend_from_slice(&crc.to_be_bytes());
        let transport = MockTransport::scripted(script);
        let mut proto = DavisProtocol::new(transport, config());
        let dt = proto.get_time().unwrap();
        assert_eq!(dt, chrono::NaiveDate::from_ymd_opt(2024, 6, 12).unwrap().and_hms_opt(14, 45, 30).unwrap());
    }

    #[test]
    fn get_time_reports_no_time_on_crc_mismatch() {
        let payload = [30u8, 45, 14, 12, 6, 124];
        let mut script = vec![ACK];
        script.extend_from_slice(&payload);
        script.extend_from_slice(&[0x00, 0x00]);
        let transport = MockTransport::scripted(script);
        let mut proto = DavisProtocol::new(transport, config());
        assert!(matches!(proto.get_time(), Err(ProtocolError::NoTime)));
    }

    #[test]
    fn set_time_sends_encoded_frame_and_waits_for_ack() {
        let transport = MockTransport::scripted([ACK, ACK]);
        let mut proto = DavisProtocol::new(transport, config());
        let when = chrono::NaiveDate::from_ymd_opt(2024, 6, 12)
            .unwrap()
            .and_hms_opt(14, 45, 30)
            .unwrap();
        proto.set_time(when).unwrap();

        let written = &proto.transport.written;
        assert!(written.starts_with(b"SETTIME\n"));
        let payload = &written[b"SETTIME\n".len()..b"SETTIME\n".len() + 6];
        assert_eq!(payload, &[30, 45, 14, 12, 6, 124]);
    }

    fn slot_bytes(date: (u16, u8, u8), time: (u8, u8), out_temp: i16) -> [u8; RECORD_LEN] {
        let mut slot = [0u8; RECORD_LEN];
        slot[0..2].copy_from_slice(&codec::encode_date(Some(date)).to_le_bytes());
        slot[2..4].copy_from_slice(&codec::encode_time(time.0, time.1).to_le_bytes());
        slot[4..6].copy_from_slice(&out_temp.to_le_bytes());
        slot[6..8].copy_from_slice(&(-32768i16).to_le_bytes());
        slot[8..10].copy_from_slice(&32767i16.to_le_bytes());
        slot[16..18].copy_from_slice(&32767u16.to_le_bytes());
        slot[20..22].copy_from_slice(&32767i16.to_le_bytes());
        slot[22] = 255;
        slot[23] = 255;
        slot[24] = 255;
        slot[26] = 255;
        slot[27] = 255;
        slot
    }

    fn build_page(seq: u8, slots: [[u8; RECORD_LEN]; SLOTS_PER_PAGE]) -> Vec<u8> {
        let mut body = Vec::with_capacity(PAGE_BODY_LEN);
        body.push(seq);
        for slot in &slots {
            body.extend_from_slice(slot);
        }
        body.resize(PAGE_BODY_LEN, 0); // trailing unused bytes
        let crc = crc::checksum(&body);
        let mut page = body;
        page.extend_from_slice(&crc.to_be_bytes());
        page
    }

    #[test]
    fn get_archive_data_decodes_filters_and_sorts() {
        let since = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();

        let blank = [0u8; RECORD_LEN];
        let later = slot_bytes((2024, 6, 12), (14, 45), 215);
        let earliest = slot_bytes((2024, 6, 2), (8, 0), 300);
        let before_since = slot_bytes((2024, 5, 1), (0, 0), 100);

        let slots = [later, earliest, before_since, blank, blank];
        let page = build_page(0, slots);

        let header = [1u8, 0, 0, 0]; // num_pages=1, valid_record=0
        let header_crc = crc::checksum(&header);

        let mut script = vec![ACK, ACK];
        script.extend_from_slice(&header);
        script.extend_from_slice(&header_crc.to_be_bytes());
        script.extend_from_slice(&page);

        let transport = MockTransport::scripted(script);
        let mut proto = DavisProtocol::new(transport, config());
        let records = proto.get_archive_data(since).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(records.iter().all(|r| r.timestamp > since));
        assert_eq!(records[0].timestamp.day(), 2);
        assert_eq!(records[1].timestamp.day(), 12);
    }

    #[test]
    fn get_archive_data_drops_page_with_bad_crc() {
        let since = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let slots = [slot_bytes((2024, 6, 12), (14, 45), 215), [0u8; RECORD_LEN], [0u8; RECORD_LEN], [0u8; RECORD_LEN], [0u8; RECORD_LEN]];
        let mut page = build_page(0, slots);
        let last = page.len() - 1;
        page[last] ^= 0xFF; // corrupt the trailing CRC byte

        let header = [1u8, 0, 0, 0];
        let header_crc = crc::checksum(&header);
        let mut script = vec![ACK, ACK];
        script.extend_from_slice(&header);
        script.extend_from_slice(&header_crc.to_be_bytes());
        script.extend_from_slice(&page);

        let transport = MockTransport::scripted(script);
        let mut proto = DavisProtocol::new(transport, config());
        let records = proto.get_archive_data(since).unwrap();
        assert!(records.is_empty());
    }
}
