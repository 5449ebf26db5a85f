/// MP3 joiner for per-segment provider output.
///
/// Each part may carry a leading ID3v2 tag; the tag is stripped and never
/// reinserted, leaving raw concatenated frames. Decoders tolerate the
/// header-less trailing segments as long as every part shares the same codec
/// parameters, which holds because all segments of one job use one voice,
/// engine and format. No parameter validation or transcoding happens here.
pub fn join_mp3(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(strip_id3v2(part));
    }
    out
}

/// Strip a leading ID3v2 tag if present.
///
/// The tag size lives in bytes 6..10 as a synch-safe big-endian integer:
/// four bytes, high bit of each masked off, 7 bits apiece.
fn strip_id3v2(data: &[u8]) -> &[u8] {
    if data.len() >= 10 && &data[0..3] == b"ID3" {
        let size = ((data[6] & 0x7F) as usize) << 21
            | ((data[7] & 0x7F) as usize) << 14
            | ((data[8] & 0x7F) as usize) << 7
            | (data[9] & 0x7F) as usize;
        let header_len = 10 + size;
        if header_len < data.len() {
            return &data[header_len..];
        }
    }
    data
}
