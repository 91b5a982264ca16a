//! `text/event-stream` framing.

use bytes::Bytes;

use crate::event::BoardEvent;

/// Message carried by the first frame of every stream.
pub const CONNECTED_MESSAGE: &str = "Connected to board updates";

/// Comment frame used as keep-alive. Clients ignore it.
pub const KEEP_ALIVE_FRAME: &[u8] = b": keep-alive\n\n";

/// Encode an event as a single `data:` frame.
pub fn encode_frame(event: &BoardEvent) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_vec(event)?;
    let mut frame = Vec::with_capacity(json.len() + 8);
    frame.extend_from_slice(b"data: ");
    frame.extend_from_slice(&json);
    frame.extend_from_slice(b"\n\n");
    Ok(Bytes::from(frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_frame() {
        let frame = encode_frame(&BoardEvent::connected()).unwrap();
        assert_eq!(
            &frame[..],
            b"data: {\"type\":\"connected\",\"message\":\"Connected to board updates\"}\n\n"
        );
    }

    #[test]
    fn test_single_line_payload() {
        let frame = encode_frame(&BoardEvent::ListDeleted {
            list_id: "line\nbreak".into(),
        })
        .unwrap();
        let text = std::str::from_utf8(&frame).unwrap();
        // The only newlines are the frame terminator.
        assert_eq!(text.matches('\n').count(), 2);
        assert!(text.ends_with("\n\n"));
    }
}
