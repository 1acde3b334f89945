//! Conversion between tether values and OSC packets.
//!
//! Encoding and decoding are done by `rosc`; this module only maps
//! argument types. Outgoing arrays are flattened into the argument list,
//! since most OSC peers cannot receive nested arrays.

use rosc::{OscMessage, OscPacket, OscType};
use serde_json::{Number, Value};

use crate::error::CodecError;

/// One decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Datagram {
    /// The OSC address.
    pub address: String,
    /// The arguments, in order.
    pub args: Vec<Value>,
}

/// Encode a message with a flattened argument list.
pub fn encode(address: &str, args: &[Value]) -> Result<Vec<u8>, CodecError> {
    let mut osc_args = Vec::with_capacity(args.len());
    for arg in args {
        flatten_into(arg, &mut osc_args);
    }
    let packet = OscPacket::Message(OscMessage {
        addr: address.to_owned(),
        args: osc_args,
    });
    rosc::encoder::encode(&packet).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode one datagram. Bundles are rejected.
pub fn decode(bytes: &[u8]) -> Result<Datagram, CodecError> {
    let (_, packet) =
        rosc::decoder::decode_udp(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
    match packet {
        OscPacket::Message(message) => Ok(Datagram {
            address: message.addr,
            args: message.args.into_iter().map(from_osc).collect(),
        }),
        OscPacket::Bundle(_) => Err(CodecError::Bundle),
    }
}

fn flatten_into(value: &Value, out: &mut Vec<OscType>) {
    match value {
        Value::Null => out.push(OscType::Nil),
        Value::Bool(b) => out.push(OscType::Bool(*b)),
        Value::Number(n) => out.push(number_to_osc(n)),
        Value::String(s) => out.push(OscType::String(s.clone())),
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(_) => out.push(OscType::String(value.to_string())),
    }
}

fn number_to_osc(n: &Number) -> OscType {
    if let Some(i) = n.as_i64() {
        return match i32::try_from(i) {
            Ok(small) => OscType::Int(small),
            Err(_) => OscType::Long(i),
        };
    }
    if let Some(u) = n.as_u64() {
        return OscType::Double(u as f64);
    }
    OscType::Float(n.as_f64().unwrap_or(0.0) as f32)
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

fn from_osc(arg: OscType) -> Value {
    match arg {
        OscType::Int(i) => Value::from(i),
        OscType::Long(i) => Value::from(i),
        // Shortest decimal form of the f32, so 0.1f32 arrives as 0.1.
        OscType::Float(f) => float_value(f.to_string().parse().unwrap_or(f64::from(f))),
        OscType::Double(f) => float_value(f),
        OscType::String(s) => Value::String(s),
        OscType::Char(c) => Value::String(c.to_string()),
        OscType::Bool(b) => Value::Bool(b),
        OscType::Blob(bytes) => Value::Array(bytes.into_iter().map(Value::from).collect()),
        OscType::Array(array) => Value::Array(array.content.into_iter().map(from_osc).collect()),
        OscType::Nil | OscType::Inf => Value::Null,
        other => {
            tracing::trace!(arg = ?other, "tether.codec.unsupported_arg");
            Value::Null
        }
    }
}
