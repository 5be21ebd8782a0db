//! DSSE pre-authentication encoding.

/// Build the PAE byte string signed by DSSE signers:
/// `"DSSEv1" SP len(type) SP type SP len(payload) SP payload`.
///
/// Lengths are byte counts in base-10 ASCII. The payload is taken as raw bytes.
pub fn encode(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let type_len = payload_type.len().to_string();
    let payload_len = payload.len().to_string();

    let mut pae = Vec::with_capacity(
        7 + type_len.len() + payload_type.len() + payload_len.len() + payload.len() + 3,
    );
    pae.extend_from_slice(b"DSSEv1 ");
    pae.extend_from_slice(type_len.as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload_type.as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload_len.as_bytes());
    pae.push(b' ');
    pae.extend_from_slice(payload);
    pae
}
