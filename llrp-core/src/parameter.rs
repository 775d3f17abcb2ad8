//! LLRP parameter encoding and decoding
//!
//! Parameters come in two wire formats selected by the type code:
//!
//! ```text
//! TV  (type < 128):   ┌─1──┬─7 bits─┬──────────────┐
//!                     │ 1  │  type  │    value     │   length implicit,
//!                     └────┴────────┴──────────────┘   fixed per type
//!
//! TLV (type >= 128):  ┌─6 bits─┬─10 bits─┬─16 bits─┬──────────────┐
//!                     │ rsvd=0 │  type   │ length  │    value     │
//!                     └────────┴─────────┴─────────┴──────────────┘
//! ```
//!
//! All multi-byte values are big-endian. TLV `length` covers the whole
//! record including its 4-byte header. Container types nest further
//! parameters inside their value region, after a fixed-size prefix given
//! by the registry's `static_length`.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{Error, Result};
use crate::registry;

/// TLV parameter header size in bytes
pub const TLV_HEADER_SIZE: usize = 4;

/// Defensive cap on parameter nesting; LLRP trees are shallow by spec
pub const MAX_NESTING_DEPTH: usize = 32;

/// A decoded or built LLRP parameter
///
/// For leaf types `value` holds the full value region and `sub_params` is
/// empty. For container types `value` holds only the fixed prefix (the
/// non-parameter fields before the first child) and the children live in
/// `sub_params`; the wire bytes are recomputed bottom-up on every encode,
/// so a stale length can never leak to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Numeric type code; `< 128` selects TV encoding, `>= 128` TLV
    pub ty: u16,

    /// Value bytes (leaf) or fixed prefix bytes (container)
    pub value: Bytes,

    /// Nested parameters, in wire order
    pub sub_params: Vec<Parameter>,
}

impl Parameter {
    /// Build a TV-encoded leaf parameter
    ///
    /// The value length must match the registry's `tv_length - 1` for the
    /// type to decode back; that is the caller's contract, not checked here.
    pub fn tv(ty: u16, value: impl Into<Bytes>) -> Self {
        debug_assert!(ty < 128, "TV type codes are 7-bit");
        Self {
            ty,
            value: value.into(),
            sub_params: Vec::new(),
        }
    }

    /// Build a TLV-encoded leaf parameter
    pub fn tlv(ty: u16, value: impl Into<Bytes>) -> Self {
        debug_assert!(ty >= 128, "TLV type codes start at 128");
        Self {
            ty,
            value: value.into(),
            sub_params: Vec::new(),
        }
    }

    /// Build a TLV container with nested parameters and no fixed prefix
    pub fn container(ty: u16, sub_params: Vec<Parameter>) -> Self {
        Self::container_with_prefix(ty, Bytes::new(), sub_params)
    }

    /// Build a TLV container whose value region starts with fixed fields
    /// followed by nested parameters
    pub fn container_with_prefix(
        ty: u16,
        prefix: impl Into<Bytes>,
        sub_params: Vec<Parameter>,
    ) -> Self {
        debug_assert!(ty >= 128, "TV parameters cannot nest");
        Self {
            ty,
            value: prefix.into(),
            sub_params,
        }
    }

    /// Check if this parameter uses the compact TV encoding
    pub fn is_tv(&self) -> bool {
        self.ty < 128
    }

    /// Get the symbolic type name, if the type is registered
    pub fn type_name(&self) -> Option<&'static str> {
        registry::param_name(self.ty)
    }

    /// Find the first direct child of the given type
    pub fn find_sub(&self, ty: u16) -> Option<&Parameter> {
        self.sub_params.iter().find(|p| p.ty == ty)
    }

    /// Total encoded size in bytes, computed bottom-up
    pub fn encoded_len(&self) -> usize {
        let children: usize = self.sub_params.iter().map(Parameter::encoded_len).sum();
        if self.is_tv() {
            1 + self.value.len()
        } else {
            TLV_HEADER_SIZE + self.value.len() + children
        }
    }

    /// Encode this parameter and its subtree to bytes
    ///
    /// Fails with [`Error::InvalidEncoding`] if any TLV record in the tree
    /// exceeds the 16-bit length field; a silently wrapped length would
    /// corrupt every following byte on the wire.
    pub fn encode(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Encode into an existing buffer
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<()> {
        if self.is_tv() {
            buf.put_u8(0x80 | self.ty as u8);
            buf.put_slice(&self.value);
        } else {
            let length = u16::try_from(self.encoded_len()).map_err(|_| {
                Error::InvalidEncoding(format!(
                    "TLV parameter {} encodes to {} bytes, beyond the 16-bit length field",
                    self.ty,
                    self.encoded_len()
                ))
            })?;
            buf.put_u8(((self.ty >> 8) & 0x03) as u8);
            buf.put_u8(self.ty as u8);
            buf.put_u16(length);
            buf.put_slice(&self.value);
            for child in &self.sub_params {
                child.encode_into(buf)?;
            }
        }
        Ok(())
    }

    /// Decode an ordered parameter sequence from a byte region
    ///
    /// The encoded lengths of the returned parameters sum exactly to the
    /// region length. An empty region decodes to an empty sequence.
    /// Unknown TLV types are kept as opaque leaves so one unrecognized
    /// type cannot desynchronize its siblings; unknown TV types fail with
    /// [`Error::UnknownType`] since their length is not self-describing.
    pub fn decode_all(region: &[u8]) -> Result<Vec<Parameter>> {
        decode_region(region, 0)
    }

    /// Decode as much of a parameter sequence as the region allows
    ///
    /// Like [`Parameter::decode_all`], but a fault partway through returns
    /// the parameters decoded before it together with the error, instead of
    /// discarding them. Callers use this to salvage the valid records in
    /// front of a damaged tail; a clean region returns `None` for the fault.
    pub fn decode_available(region: &[u8]) -> (Vec<Parameter>, Option<Error>) {
        let mut params = Vec::new();
        let mut offset = 0;

        while offset < region.len() {
            match decode_one(&region[offset..], 0) {
                Ok((param, consumed)) => {
                    params.push(param);
                    offset += consumed;
                }
                Err(e) => return (params, Some(e)),
            }
        }

        (params, None)
    }
}

fn decode_region(region: &[u8], depth: usize) -> Result<Vec<Parameter>> {
    if depth > MAX_NESTING_DEPTH {
        return Err(Error::InvalidEncoding(format!(
            "parameter nesting exceeds {MAX_NESTING_DEPTH} levels"
        )));
    }

    let mut params = Vec::new();
    let mut offset = 0;

    while offset < region.len() {
        let (param, consumed) = decode_one(&region[offset..], depth)?;
        params.push(param);
        offset += consumed;
    }

    Ok(params)
}

fn decode_one(rest: &[u8], depth: usize) -> Result<(Parameter, usize)> {
    let first = rest[0];

    // MSB of the first octet selects the format
    if first & 0x80 != 0 {
        decode_tv(first, rest)
    } else {
        decode_tlv(first, rest, depth)
    }
}

fn decode_tv(first: u8, rest: &[u8]) -> Result<(Parameter, usize)> {
    let ty = (first & 0x7F) as u16;

    let tv_length = registry::param_def(ty)
        .map(|d| d.tv_length)
        .filter(|&len| len > 0)
        .ok_or(Error::UnknownType(ty))?;

    if rest.len() < tv_length {
        return Err(Error::TruncatedParameter {
            needed: tv_length,
            available: rest.len(),
        });
    }

    trace!(ty, tv_length, "decoded TV parameter");

    let parameter = Parameter {
        ty,
        value: Bytes::copy_from_slice(&rest[1..tv_length]),
        sub_params: Vec::new(),
    };
    Ok((parameter, tv_length))
}

fn decode_tlv(first: u8, rest: &[u8], depth: usize) -> Result<(Parameter, usize)> {
    if rest.len() < TLV_HEADER_SIZE {
        return Err(Error::TruncatedParameter {
            needed: TLV_HEADER_SIZE,
            available: rest.len(),
        });
    }

    let ty = ((first as u16 & 0x03) << 8) | rest[1] as u16;
    let length = u16::from_be_bytes([rest[2], rest[3]]) as usize;

    if length < TLV_HEADER_SIZE {
        return Err(Error::InvalidEncoding(format!(
            "TLV parameter {ty} declares length {length}, below its own 4-byte header"
        )));
    }
    if rest.len() < length {
        return Err(Error::TruncatedParameter {
            needed: length,
            available: rest.len(),
        });
    }

    let value_region = &rest[TLV_HEADER_SIZE..length];

    // Container-bearing types recurse past their fixed prefix; everything
    // else, including unregistered vendor/extension types, stays opaque.
    let parameter = match registry::param_def(ty) {
        Some(def) if def.has_sub_params => {
            let prefix_len = def.static_length.saturating_sub(TLV_HEADER_SIZE);
            if value_region.len() < prefix_len {
                return Err(Error::TruncatedParameter {
                    needed: def.static_length,
                    available: rest.len().min(length),
                });
            }
            Parameter {
                ty,
                value: Bytes::copy_from_slice(&value_region[..prefix_len]),
                sub_params: decode_region(&value_region[prefix_len..], depth + 1)?,
            }
        }
        _ => Parameter {
            ty,
            value: Bytes::copy_from_slice(value_region),
            sub_params: Vec::new(),
        },
    };

    trace!(ty, length, children = parameter.sub_params.len(), "decoded TLV parameter");

    Ok((parameter, length))
}
