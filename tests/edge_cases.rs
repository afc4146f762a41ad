#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Edge cases around registration contracts and hostile inbound bytes

use peerwire::core::{opcode_for, Codec, Wire};
use peerwire::error::{ProtocolError, RegistrationError, Result};

#[derive(Debug, Clone, PartialEq)]
struct Named(&'static str, Vec<u8>);

impl Wire for Named {
    fn shape_name(&self) -> &'static str {
        self.0
    }

    fn marshal(&self) -> Result<Vec<u8>> {
        Ok(self.1.clone())
    }
}

fn decoder(name: &'static str) -> impl Fn(&[u8]) -> Result<Named> + Send + Sync + 'static {
    move |data: &[u8]| Ok(Named(name, data.to_vec()))
}

// ============================================================================
// REGISTRATION
// ============================================================================

#[test]
fn test_opcode_collision_is_fatal() {
    // "plumless" and "buckeroo" share a CRC-32
    assert_eq!(opcode_for("plumless"), opcode_for("buckeroo"));

    let codec = Codec::new();
    let opcode = codec
        .register(&Named("plumless", vec![]), decoder("plumless"))
        .unwrap();

    let err = codec
        .register(&Named("buckeroo", vec![]), decoder("buckeroo"))
        .unwrap_err();

    assert_eq!(
        err,
        RegistrationError::OpcodeCollision {
            shape: "buckeroo".into(),
            existing: "plumless".into(),
            opcode,
        }
    );
    let text = err.to_string();
    assert!(text.contains("plumless") && text.contains("buckeroo"));

    // the first owner keeps the opcode
    let wire = codec.encode(&Named("plumless", b"x".to_vec())).unwrap();
    assert_eq!(codec.decode(&wire).unwrap(), Named("plumless", b"x".to_vec()));
    assert!(matches!(
        codec.encode(&Named("buckeroo", vec![])),
        Err(ProtocolError::UnregisteredType(_))
    ));
    assert_eq!(codec.registry().len(), 1);
}

#[test]
fn test_unicode_shape_names() {
    let codec = Codec::new();
    let opcode = codec
        .register(&Named("Привет", vec![]), decoder("Привет"))
        .unwrap();
    assert_eq!(opcode, opcode_for("Привет"));
    assert_eq!(opcode, crc32fast::hash("Привет".as_bytes()));
}

#[test]
fn test_many_shapes() {
    let names: Vec<&'static str> = (0..512)
        .map(|i| &*Box::leak(format!("Shape{i}").into_boxed_str()))
        .collect();

    let codec = Codec::with_capacity(4);
    for &name in &names {
        codec.register(&Named(name, vec![]), decoder(name)).unwrap();
    }
    assert_eq!(codec.registry().len(), names.len());

    for &name in &names {
        let wire = codec.encode(&Named(name, name.as_bytes().to_vec())).unwrap();
        assert_eq!(codec.decode(&wire).unwrap().0, name);
    }
}

// ============================================================================
// HOSTILE INPUT
// ============================================================================

#[test]
fn test_garbage_never_panics() {
    let codec = Codec::new();
    codec.register(&Named("Ping", vec![]), decoder("Ping")).unwrap();

    let mut seed: u32 = 0x1234_5678;
    for len in 0..256usize {
        let data: Vec<u8> = (0..len)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                seed as u8
            })
            .collect();
        match codec.decode(&data) {
            Ok(msg) => assert_eq!(msg.0, "Ping"),
            Err(ProtocolError::TruncatedEnvelope(n)) => assert!(n < 4),
            Err(ProtocolError::UnregisteredOpcode(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
}

#[test]
fn test_opcode_only_envelope() {
    let codec = Codec::new();
    codec.register(&Named("Empty", vec![]), decoder("Empty")).unwrap();

    let wire = opcode_for("Empty").to_be_bytes();
    assert_eq!(codec.decode(&wire).unwrap(), Named("Empty", vec![]));
}

#[test]
fn test_unregistered_opcode_reported() {
    let codec: Codec<Named> = Codec::new();
    let err = codec.decode(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00]).unwrap_err();
    assert!(matches!(err, ProtocolError::UnregisteredOpcode(0xDEAD_BEEF)));
    assert!(err.should_disconnect());
}
