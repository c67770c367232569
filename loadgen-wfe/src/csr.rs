//! Minimal DER encoding of PKCS#10 certificate requests
//!
//! Only what issuance needs: an Ed25519 subject key, a common name and a
//! subjectAltName extension request listing DNS names.

use crate::jws::JwsSigner;

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_OID: u8 = 0x06;
const TAG_UTF8_STRING: u8 = 0x0C;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_SET: u8 = 0x31;
const TAG_ATTRIBUTES: u8 = 0xA0;
const TAG_DNS_NAME: u8 = 0x82;

// 1.3.101.112
const OID_ED25519: &[u8] = &[0x2B, 0x65, 0x70];
// 2.5.4.3
const OID_COMMON_NAME: &[u8] = &[0x55, 0x04, 0x03];
// 1.2.840.113549.1.9.14
const OID_EXTENSION_REQUEST: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x0E];
// 2.5.29.17
const OID_SUBJECT_ALT_NAME: &[u8] = &[0x55, 0x1D, 0x11];

fn push_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 4);
    out.push(tag);
    push_length(&mut out, content.len());
    out.extend_from_slice(content);
    out
}

fn sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(TAG_SEQUENCE, &parts.concat())
}

fn bit_string(bytes: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(bytes.len() + 1);
    // no unused bits
    content.push(0);
    content.extend_from_slice(bytes);
    tlv(TAG_BIT_STRING, &content)
}

fn ed25519_algorithm() -> Vec<u8> {
    sequence(&[tlv(TAG_OID, OID_ED25519)])
}

fn subject(common_name: &str) -> Vec<u8> {
    let attribute = sequence(&[
        tlv(TAG_OID, OID_COMMON_NAME),
        tlv(TAG_UTF8_STRING, common_name.as_bytes()),
    ]);
    sequence(&[tlv(TAG_SET, &attribute)])
}

fn extension_request(names: &[String]) -> Vec<u8> {
    let general_names: Vec<Vec<u8>> = names
        .iter()
        .map(|name| tlv(TAG_DNS_NAME, name.as_bytes()))
        .collect();
    let san = sequence(&[
        tlv(TAG_OID, OID_SUBJECT_ALT_NAME),
        tlv(TAG_OCTET_STRING, &sequence(&general_names)),
    ]);
    let extensions = sequence(&[san]);
    sequence(&[
        tlv(TAG_OID, OID_EXTENSION_REQUEST),
        tlv(TAG_SET, &extensions),
    ])
}

/// Signed DER certificate request for `names`, the first being the CN
pub fn build_csr(key: &JwsSigner, names: &[String]) -> Vec<u8> {
    let common_name = names.first().map(String::as_str).unwrap_or_default();
    let public_key = key.verifying_key();

    let request_info = sequence(&[
        tlv(TAG_INTEGER, &[0]),
        subject(common_name),
        sequence(&[ed25519_algorithm(), bit_string(public_key.as_bytes())]),
        tlv(TAG_ATTRIBUTES, &extension_request(names)),
    ]);
    let signature = key.sign_raw(&request_info);

    sequence(&[request_info, ed25519_algorithm(), bit_string(&signature)])
}
