use dsse_verify::pae::encode;
use proptest::prelude::*;

proptest! {
    #[test]
    fn encoding_is_deterministic(payload_type in ".{0,40}", payload in proptest::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(encode(&payload_type, &payload), encode(&payload_type, &payload));
    }

    #[test]
    fn encoding_frames_type_and_payload(payload_type in "[a-z/+.-]{0,40}", payload in proptest::collection::vec(any::<u8>(), 0..256)) {
        let pae = encode(&payload_type, &payload);
        let header = format!("DSSEv1 {} {} {} ", payload_type.len(), payload_type, payload.len());

        prop_assert!(pae.starts_with(header.as_bytes()));
        prop_assert_eq!(&pae[header.len()..], payload.as_slice());
        prop_assert_eq!(pae.len(), header.len() + payload.len());
    }
}
