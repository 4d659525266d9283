//! Frame I/O over the live transport stream.
//!
//! On the wire a frame is `varint(payload_len) ++ payload`. The length
//! varint is decoded directly off the stream, one byte at a time, because
//! the receive loop cannot size its buffer until the declared length is
//! known — this is the seam between the transport and the in-memory
//! [`ByteCursor`](crate::core::buffer::ByteCursor) readers.
//!
//! Payload accumulation uses `read_exact`, which keeps issuing reads until
//! the declared byte count has arrived; partial reads are expected and the
//! declared length exactly bounds what is consumed, so one frame never
//! bleeds into the next.

use crate::core::buffer::{ByteBuf, MAX_VARINT_LEN};
use crate::error::{ProtocolError, Result};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Decode one varint off the stream.
pub async fn read_varint<R>(io: &mut R) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let first = io.read_u8().await?;
    finish_varint(first, io).await
}

/// Decode the remainder of a varint whose first byte is already in hand.
///
/// The session's receive probe pulls the first byte to learn whether any
/// frame is pending at all; this picks up from there.
pub async fn finish_varint<R>(first: u8, io: &mut R) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut value = u64::from(first & 0x7F);
    let mut byte = first;
    let mut group = 0usize;
    while byte & 0x80 != 0 {
        group += 1;
        if group >= MAX_VARINT_LEN {
            return Err(ProtocolError::VarintOverflow);
        }
        byte = io.read_u8().await?;
        if group == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(ProtocolError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7F) << (7 * group);
    }
    Ok(value)
}

/// Read one full frame payload given its already-consumed first length byte.
///
/// The payload buffer is allocated exactly once from the declared length;
/// declared lengths above `max_frame` are rejected before allocation.
pub async fn read_frame_after<R>(first: u8, io: &mut R, max_frame: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let declared = finish_varint(first, io).await?;
    if declared > max_frame as u64 {
        return Err(ProtocolError::OversizedFrame(declared as usize));
    }
    let mut payload = vec![0u8; declared as usize];
    io.read_exact(&mut payload).await?;
    Ok(Bytes::from(payload))
}

/// Read one full frame: length varint, then exactly that many payload bytes.
pub async fn read_frame<R>(io: &mut R, max_frame: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let first = io.read_u8().await?;
    read_frame_after(first, io, max_frame).await
}

/// Write one frame and flush the transport.
pub async fn write_frame<W>(io: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut head = ByteBuf::with_capacity(MAX_VARINT_LEN);
    head.put_var_u64(payload.len() as u64);
    io.write_all(&head.flush()).await?;
    io.write_all(payload).await?;
    io.flush().await?;
    Ok(())
}
