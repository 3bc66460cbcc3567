use anyhow::{anyhow, Result};
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};

use crate::outcome::{LookupError, LookupOutcome};

/// Build an A/IN query for the given domain.
///
/// Returns the serialized query bytes ready to send over UDP.
pub fn build_query(domain: &str, txid: u16) -> Result<Vec<u8>> {
	let name = Name::from_ascii(domain)
		.map_err(|e| anyhow!("invalid domain name '{}': {}", domain, e))?;

	let mut message = Message::new();
	message.set_id(txid);
	message.set_recursion_desired(true);
	message.add_query(Query::query(name, RecordType::A));

	let bytes = message.to_vec()
		.map_err(|e| anyhow!("failed to serialize DNS query: {}", e))?;
	Ok(bytes)
}

/// Parse a DNS reply, validating the transaction ID and message type.
pub fn parse_response(bytes: &[u8], expected_txid: u16) -> Result<Message> {
	let message = Message::from_vec(bytes)
		.map_err(|e| anyhow!("failed to parse DNS response: {}", e))?;

	if message.id() != expected_txid {
		return Err(anyhow!(
			"txid mismatch: expected {}, got {}",
			expected_txid, message.id()
		));
	}

	if message.message_type() != MessageType::Response {
		return Err(anyhow!("received a query instead of a response"));
	}

	Ok(message)
}

/// Classify a parsed reply: rcode first, then the answer section.
pub fn classify_response(message: &Message) -> LookupOutcome {
	let rcode = message.response_code();
	if rcode != ResponseCode::NoError {
		return LookupOutcome::Failed(LookupError::Protocol(rcode));
	}
	match message.answers().first() {
		Some(record) => LookupOutcome::Resolved(record.data().to_string()),
		None => LookupOutcome::Failed(LookupError::EmptyAnswer),
	}
}

/// Turn raw reply bytes into an outcome; undecodable replies are transport errors.
pub fn classify_reply(bytes: &[u8], expected_txid: u16) -> LookupOutcome {
	match parse_response(bytes, expected_txid) {
		Ok(message) => classify_response(&message),
		Err(e) => LookupOutcome::Failed(LookupError::Transport(e.to_string())),
	}
}
