//! ECDH-ES key agreement over X25519 ([RFC7518] §4.6, [RFC8037]).
//!
//! `ECDH-ES` derives the CEK directly from the shared secret (the
//! encrypted-key segment stays empty); `ECDH-ES+A128KW`/`+A256KW` derive
//! an intermediate wrapping key and carry the CEK under AES Key Wrap.
//! Either way the ephemeral public key travels in the `epk` header entry.
//!
//! The KDF is the Concat KDF of NIST SP 800-56A §5.8.1 with SHA-256:
//! AlgorithmID is the `enc` code for direct agreement and the `alg` code
//! for the wrapping variants; PartyUInfo/PartyVInfo come from the `apu` /
//! `apv` header entries when present.
//!
//! [RFC7518]: https://www.rfc-editor.org/rfc/rfc7518
//! [RFC8037]: https://www.rfc-editor.org/rfc/rfc8037

use std::ops::RangeInclusive;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use x25519_dalek::{EphemeralSecret, PublicKey};
use zeroize::Zeroizing;

use crate::alg::{Algorithm, AlgorithmFamily};
use crate::error::{Error, Result};
use crate::header_map::HeaderMap;
use crate::key::SecretKey;
use crate::keywrap::aeskw::{kw_unwrap, kw_wrap};
use crate::keywrap::KeyManagementAlgorithm;
use crate::b64;

/// ECDH-ES direct key agreement.
pub struct EcdhEs;

/// ECDH-ES key agreement with the CEK wrapped under A128KW.
pub struct EcdhEsA128Kw;

/// ECDH-ES key agreement with the CEK wrapped under A256KW.
pub struct EcdhEsA256Kw;

/// The `epk` header entry: an ephemeral X25519 public key in JWK form.
#[derive(Debug, Deserialize, Serialize)]
struct EphemeralKey {
    kty: String,
    crv: String,
    x: String,
}

impl EphemeralKey {
    fn write(header: &mut HeaderMap, public: &PublicKey) -> Result<()> {
        let epk = Self {
            kty: "OKP".into(),
            crv: "X25519".into(),
            x: b64::encode(public.as_bytes()),
        };
        let value = serde_json::to_value(&epk)
            .map_err(|e| Error::configuration(format!("serializing epk: {e}")))?;
        header.insert("epk", value);
        Ok(())
    }

    fn read(header: &HeaderMap) -> Result<PublicKey> {
        let value =
            header.get("epk").ok_or_else(|| Error::format("missing `epk` header entry"))?;
        let epk: Self = serde_json::from_value(value.clone())
            .map_err(|e| Error::format(format!("malformed `epk` header entry: {e}")))?;
        if epk.kty != "OKP" || epk.crv != "X25519" {
            return Err(Error::format(format!("unsupported epk curve {}/{}", epk.kty, epk.crv)));
        }
        let x = b64::decode(&epk.x)?;
        let x: [u8; 32] = x
            .as_slice()
            .try_into()
            .map_err(|_| Error::format("epk `x` must decode to 32 bytes"))?;
        Ok(PublicKey::from(x))
    }
}

// Concat KDF (NIST SP 800-56A §5.8.1, approved alternative 1) with SHA-256
fn concat_kdf(z: &[u8], algorithm_id: &str, header: &HeaderMap, dest: &mut [u8]) -> Result<()> {
    let apu = party_info(header, "apu")?;
    let apv = party_info(header, "apv")?;
    let key_bits = u32::try_from(dest.len() * 8)
        .map_err(|_| Error::ParameterSize { name: "cek", expected: 64, actual: dest.len() })?;

    let mut offset = 0;
    let mut round: u32 = 1;
    while offset < dest.len() {
        let mut hasher = Sha256::new();
        hasher.update(round.to_be_bytes());
        hasher.update(z);
        hasher.update(u32::try_from(algorithm_id.len()).unwrap_or(0).to_be_bytes());
        hasher.update(algorithm_id.as_bytes());
        hasher.update(u32::try_from(apu.len()).unwrap_or(0).to_be_bytes());
        hasher.update(&*apu);
        hasher.update(u32::try_from(apv.len()).unwrap_or(0).to_be_bytes());
        hasher.update(&*apv);
        hasher.update(key_bits.to_be_bytes());

        let digest = hasher.finalize();
        let take = usize::min(digest.len(), dest.len() - offset);
        dest[offset..offset + take].copy_from_slice(&digest[..take]);
        offset += take;
        round += 1;
    }
    Ok(())
}

fn party_info(header: &HeaderMap, name: &str) -> Result<Zeroizing<Vec<u8>>> {
    match header.get_str(name) {
        Some(encoded) => Ok(Zeroizing::new(b64::decode(encoded)?)),
        None => Ok(Zeroizing::new(Vec::new())),
    }
}

// Sender side: fresh ephemeral secret, shared secret against the
// recipient's static public key, epk written into the header.
fn agree_sender(
    kek: &SecretKey, header: &mut HeaderMap, algorithm_id: &str, dest: &mut [u8],
) -> Result<()> {
    let recipient_public = kek.x25519_public()?;
    let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral_secret);

    let shared = Zeroizing::new(ephemeral_secret.diffie_hellman(recipient_public).to_bytes());
    EphemeralKey::write(header, &ephemeral_public)?;
    concat_kdf(&*shared, algorithm_id, header, dest)
}

// Receiver side: shared secret from the static secret and the header's
// ephemeral public key.
fn agree_receiver(
    kek: &SecretKey, header: &HeaderMap, algorithm_id: &str, dest: &mut [u8],
) -> Result<()> {
    let secret = kek.x25519_secret()?;
    let ephemeral_public = EphemeralKey::read(header)?;
    let shared = Zeroizing::new(secret.diffie_hellman(&ephemeral_public).to_bytes());
    concat_kdf(&*shared, algorithm_id, header, dest)
}

fn enc_code(header: &HeaderMap) -> Result<String> {
    header
        .get_str("enc")
        .map(ToOwned::to_owned)
        .ok_or_else(|| Error::configuration("`enc` must be set before ECDH-ES key agreement"))
}

impl Algorithm for EcdhEs {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::KeyManagement
    }

    fn code(&self) -> &'static str {
        "ECDH-ES"
    }
}

impl KeyManagementAlgorithm for EcdhEs {
    fn legal_cek_len(&self, _kek_bits: u32) -> Vec<RangeInclusive<usize>> {
        vec![16..=64]
    }

    fn encrypted_cek_len(&self, _kek_bits: u32, _cek_len: usize) -> usize {
        0
    }

    fn new_cek(&self, kek: &SecretKey, header: &mut HeaderMap, cek: &mut [u8]) -> Result<()> {
        let enc = enc_code(header)?;
        agree_sender(kek, header, &enc, cek)
    }

    fn try_wrap(
        &self, _kek: &SecretKey, _header: &mut HeaderMap, _cek: &[u8], _dest: &mut [u8],
    ) -> Result<Option<usize>> {
        Err(Error::configuration("ECDH-ES cannot transport a caller-chosen CEK"))
    }

    fn try_wrap_new(
        &self, kek: &SecretKey, header: &mut HeaderMap, cek: &mut [u8], _dest: &mut [u8],
    ) -> Result<Option<usize>> {
        // the derived key is used directly; nothing travels on the wire
        self.new_cek(kek, header, cek)?;
        Ok(Some(0))
    }

    fn try_unwrap(
        &self, kek: &SecretKey, header: &HeaderMap, wrapped: &[u8], dest: &mut [u8],
    ) -> Result<Option<usize>> {
        if !wrapped.is_empty() {
            return Ok(None);
        }
        let enc = enc_code(header)?;
        agree_receiver(kek, header, &enc, dest)?;
        Ok(Some(dest.len()))
    }
}

macro_rules! ecdh_with_wrap {
    ($name:ident, $code:literal, $kw_bytes:literal) => {
        impl Algorithm for $name {
            fn family(&self) -> AlgorithmFamily {
                AlgorithmFamily::KeyManagement
            }

            fn code(&self) -> &'static str {
                $code
            }
        }

        impl KeyManagementAlgorithm for $name {
            fn legal_cek_len(&self, _kek_bits: u32) -> Vec<RangeInclusive<usize>> {
                vec![16..=64]
            }

            fn encrypted_cek_len(&self, _kek_bits: u32, cek_len: usize) -> usize {
                cek_len + 8
            }

            fn new_cek(
                &self, kek: &SecretKey, _header: &mut HeaderMap, cek: &mut [u8],
            ) -> Result<()> {
                // the CEK is independent of the agreement; it is wrapped
                // under the derived key at wrap time
                kek.x25519_public()?;
                if cek.len() < 16 || cek.len() % 8 != 0 {
                    return Err(Error::ParameterSize { name: "cek", expected: 16, actual: cek.len() });
                }
                OsRng.fill_bytes(cek);
                Ok(())
            }

            fn try_wrap(
                &self, kek: &SecretKey, header: &mut HeaderMap, cek: &[u8], dest: &mut [u8],
            ) -> Result<Option<usize>> {
                if dest.len() < cek.len() + 8 {
                    return Ok(None);
                }
                let mut kw_key = Zeroizing::new([0_u8; $kw_bytes]);
                agree_sender(kek, header, $code, &mut kw_key[..])?;
                kw_wrap(&kw_key[..], cek, dest)
            }

            fn try_unwrap(
                &self, kek: &SecretKey, header: &HeaderMap, wrapped: &[u8], dest: &mut [u8],
            ) -> Result<Option<usize>> {
                let mut kw_key = Zeroizing::new([0_u8; $kw_bytes]);
                agree_receiver(kek, header, $code, &mut kw_key[..])?;
                kw_unwrap(&kw_key[..], wrapped, dest)
            }
        }
    };
}

ecdh_with_wrap!(EcdhEsA128Kw, "ECDH-ES+A128KW", 16);
ecdh_with_wrap!(EcdhEsA256Kw, "ECDH-ES+A256KW", 32);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn direct_agreement_round_trip() {
        let recipient = SecretKey::generate_x25519();
        let sender_view = SecretKey::from_x25519_public(
            recipient.x25519_public().expect("public").as_bytes(),
        )
        .expect("should import");

        let mut header = HeaderMap::new();
        header.insert("enc", "A256GCM");

        let mut cek = [0_u8; 32];
        let mut dest = [0_u8; 0];
        let written = EcdhEs
            .try_wrap_new(&sender_view, &mut header, &mut cek, &mut dest)
            .expect("should agree")
            .expect("should fit");
        assert_eq!(written, 0);
        assert!(header.contains("epk"));

        let mut derived = [0_u8; 32];
        let n = EcdhEs.try_unwrap(&recipient, &header, &[], &mut derived).expect("should agree");
        assert_eq!(n, Some(32));
        assert_eq!(derived, cek);
    }

    #[test]
    fn wrapped_agreement_round_trip() {
        let recipient = SecretKey::generate_x25519();
        let mut header = HeaderMap::new();
        header.insert("enc", "A256GCM");

        let mut cek = [0_u8; 32];
        let mut wrapped = [0_u8; 40];
        let written = EcdhEsA256Kw
            .try_wrap_new(&recipient, &mut header, &mut cek, &mut wrapped)
            .expect("should wrap")
            .expect("should fit");
        assert_eq!(written, 40);

        let mut out = [0_u8; 32];
        let n = EcdhEsA256Kw
            .try_unwrap(&recipient, &header, &wrapped, &mut out)
            .expect("should unwrap");
        assert_eq!(n, Some(32));
        assert_eq!(out, cek);
    }

    #[test]
    fn party_info_changes_derivation() {
        let recipient = SecretKey::generate_x25519();

        let mut header = HeaderMap::new();
        header.insert("enc", "A256GCM");
        header.insert("apu", b64::encode(b"Alice"));
        header.insert("apv", b64::encode(b"Bob"));

        let mut cek = [0_u8; 32];
        let mut dest = [0_u8; 0];
        EcdhEs
            .try_wrap_new(&recipient, &mut header, &mut cek, &mut dest)
            .expect("should agree");

        // strip apu and re-derive: result must differ
        let mut stripped = header.clone();
        stripped.remove("apu");
        let mut derived = [0_u8; 32];
        EcdhEs.try_unwrap(&recipient, &stripped, &[], &mut derived).expect("should agree");
        assert_ne!(derived, cek);

        let mut derived = [0_u8; 32];
        EcdhEs.try_unwrap(&recipient, &header, &[], &mut derived).expect("should agree");
        assert_eq!(derived, cek);
    }

    #[test]
    fn missing_epk_is_format_error() {
        let recipient = SecretKey::generate_x25519();
        let mut header = HeaderMap::new();
        header.insert("enc", "A256GCM");

        let mut dest = [0_u8; 32];
        let err = EcdhEs.try_unwrap(&recipient, &header, &[], &mut dest).expect_err("no epk");
        assert!(matches!(err, Error::Format(_)));
    }
}
