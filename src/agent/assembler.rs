use encoding_rs::{Decoder, DecoderResult, UTF_8};
use futures::{Stream, StreamExt};
use tracing::trace;

use super::interface::ResponseChunk;
use crate::error::UpstreamError;

/// Drain a completion stream into one string.
///
/// Chunks are appended strictly in arrival order; chunks without a payload
/// are skipped. Decoding is incremental, so a UTF-8 sequence split across two
/// chunks is reassembled. Malformed bytes or any stream error fail the whole
/// call and the partial text is dropped.
pub async fn assemble<S>(mut stream: S) -> Result<String, UpstreamError>
where
    S: Stream<Item = Result<ResponseChunk, UpstreamError>> + Unpin,
{
    let mut decoder = UTF_8.new_decoder_without_bom_handling();
    let mut text = String::new();
    let mut index = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        match chunk.bytes.as_deref() {
            Some(bytes) if !bytes.is_empty() => {
                trace!("Chunk {}: {} bytes", index, bytes.len());
                decode_into(&mut decoder, bytes, &mut text, false)?;
            }
            _ => trace!("Chunk {}: no payload", index),
        }
        index += 1;
    }

    // Flushes a dangling partial sequence as an error.
    decode_into(&mut decoder, &[], &mut text, true)?;
    Ok(text)
}

fn decode_into(
    decoder: &mut Decoder,
    mut input: &[u8],
    text: &mut String,
    last: bool,
) -> Result<(), UpstreamError> {
    loop {
        let needed = decoder
            .max_utf8_buffer_length_without_replacement(input.len())
            .unwrap_or(input.len() * 3 + 4);
        text.reserve(needed);

        let (result, read) = decoder.decode_to_string_without_replacement(input, text, last);
        input = &input[read..];

        match result {
            DecoderResult::InputEmpty => return Ok(()),
            DecoderResult::OutputFull => continue,
            DecoderResult::Malformed(_, _) => {
                return Err(UpstreamError::Decode(
                    "Agent response contained invalid UTF-8".to_string(),
                ))
            }
        }
    }
}
