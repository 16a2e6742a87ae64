//! APDU encode/decode for the normal Get/Set/Action services.
//!
//! Wire layout (already decrypted and de-framed):
//!
//! ```text
//! get-request-normal    C0 01 <invoke> <class u16> <obis 6> <index u8> <access>
//! set-request-normal    C1 01 <invoke> <descriptor 9> <access> <value>
//! action-request-normal C3 01 <invoke> <descriptor 9> <params?>
//! get-response-normal   C4 01 <invoke> 00 <value> | 01 <result code>
//! set-response-normal   C5 01 <invoke> <result code>
//! action-response-normal C7 01 <invoke> <result code> <return?>
//! ```
//!
//! `<access>` is one presence byte, then selector byte + parameter value
//! when present. The wire form addresses objects by logical name only;
//! short-name requests are built programmatically.

use crate::request::{
    AttributeAddress, DataAccessError, ObjectName, ServiceKind, ServiceRequest, ServiceResponse,
};
use cosem_axdr::{Decoder, Encoder};
use cosem_core::{CosemError, CosemResult, ObisCode};
use cosem_object::SelectiveAccess;

const GET_REQUEST: u8 = 0xC0;
const SET_REQUEST: u8 = 0xC1;
const ACTION_REQUEST: u8 = 0xC3;
const GET_RESPONSE: u8 = 0xC4;
const SET_RESPONSE: u8 = 0xC5;
const ACTION_RESPONSE: u8 = 0xC7;
const NORMAL: u8 = 0x01;

pub fn encode_request(request: &ServiceRequest, invoke_id: u8) -> CosemResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    match request {
        ServiceRequest::Get { address, access } => {
            encoder.write_u8(GET_REQUEST);
            encoder.write_u8(NORMAL);
            encoder.write_u8(invoke_id);
            write_address(&mut encoder, address)?;
            write_access(&mut encoder, access)?;
        }
        ServiceRequest::Set {
            address,
            access,
            value,
        } => {
            encoder.write_u8(SET_REQUEST);
            encoder.write_u8(NORMAL);
            encoder.write_u8(invoke_id);
            write_address(&mut encoder, address)?;
            write_access(&mut encoder, access)?;
            encoder.write_value(value)?;
        }
        ServiceRequest::Action {
            address,
            parameters,
        } => {
            encoder.write_u8(ACTION_REQUEST);
            encoder.write_u8(NORMAL);
            encoder.write_u8(invoke_id);
            write_address(&mut encoder, address)?;
            match parameters {
                Some(value) => {
                    encoder.write_u8(1);
                    encoder.write_value(value)?;
                }
                None => encoder.write_u8(0),
            }
        }
    }
    Ok(encoder.into_bytes())
}

pub fn decode_request(bytes: &[u8]) -> CosemResult<(ServiceRequest, u8)> {
    let mut decoder = Decoder::new(bytes);
    let service = decoder.read_u8()?;
    let choice = decoder.read_u8()?;
    if choice != NORMAL {
        return Err(CosemError::Decode(format!(
            "unsupported request choice {choice:#04x}"
        )));
    }
    let invoke_id = decoder.read_u8()?;
    let address = read_address(&mut decoder)?;
    let request = match service {
        GET_REQUEST => ServiceRequest::Get {
            address,
            access: read_access(&mut decoder)?,
        },
        SET_REQUEST => {
            let access = read_access(&mut decoder)?;
            let value = decoder.read_value()?;
            ServiceRequest::Set {
                address,
                access,
                value,
            }
        }
        ACTION_REQUEST => {
            let parameters = match decoder.read_u8()? {
                0 => None,
                1 => Some(decoder.read_value()?),
                other => {
                    return Err(CosemError::Decode(format!(
                        "invalid parameter presence byte {other:#04x}"
                    )));
                }
            };
            ServiceRequest::Action {
                address,
                parameters,
            }
        }
        other => {
            return Err(CosemError::Decode(format!(
                "unknown service tag {other:#04x}"
            )));
        }
    };
    Ok((request, invoke_id))
}

pub fn encode_response(
    response: &ServiceResponse,
    kind: ServiceKind,
    invoke_id: u8,
) -> CosemResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    match kind {
        ServiceKind::Get => {
            encoder.write_u8(GET_RESPONSE);
            encoder.write_u8(NORMAL);
            encoder.write_u8(invoke_id);
            match response {
                ServiceResponse::Data(value) => {
                    encoder.write_u8(0);
                    encoder.write_value(value)?;
                }
                ServiceResponse::Error(error) => {
                    encoder.write_u8(1);
                    encoder.write_u8(error.code());
                }
                other => {
                    return Err(CosemError::Encode(format!(
                        "{other:?} is not a Get outcome"
                    )));
                }
            }
        }
        ServiceKind::Set => {
            encoder.write_u8(SET_RESPONSE);
            encoder.write_u8(NORMAL);
            encoder.write_u8(invoke_id);
            match response {
                ServiceResponse::Success => encoder.write_u8(0),
                ServiceResponse::Error(error) => encoder.write_u8(error.code()),
                other => {
                    return Err(CosemError::Encode(format!(
                        "{other:?} is not a Set outcome"
                    )));
                }
            }
        }
        ServiceKind::Action => {
            encoder.write_u8(ACTION_RESPONSE);
            encoder.write_u8(NORMAL);
            encoder.write_u8(invoke_id);
            match response {
                ServiceResponse::ActionData(return_parameters) => {
                    encoder.write_u8(0);
                    match return_parameters {
                        Some(value) => {
                            encoder.write_u8(1);
                            encoder.write_value(value)?;
                        }
                        None => encoder.write_u8(0),
                    }
                }
                ServiceResponse::Error(error) => {
                    encoder.write_u8(error.code());
                    encoder.write_u8(0);
                }
                other => {
                    return Err(CosemError::Encode(format!(
                        "{other:?} is not an Action outcome"
                    )));
                }
            }
        }
    }
    Ok(encoder.into_bytes())
}

pub fn decode_response(bytes: &[u8]) -> CosemResult<(ServiceResponse, u8)> {
    let mut decoder = Decoder::new(bytes);
    let service = decoder.read_u8()?;
    let choice = decoder.read_u8()?;
    if choice != NORMAL {
        return Err(CosemError::Decode(format!(
            "unsupported response choice {choice:#04x}"
        )));
    }
    let invoke_id = decoder.read_u8()?;
    let response = match service {
        GET_RESPONSE => match decoder.read_u8()? {
            0 => ServiceResponse::Data(decoder.read_value()?),
            1 => ServiceResponse::Error(DataAccessError::from_code(decoder.read_u8()?)),
            other => {
                return Err(CosemError::Decode(format!(
                    "invalid get-response choice {other:#04x}"
                )));
            }
        },
        SET_RESPONSE => match decoder.read_u8()? {
            0 => ServiceResponse::Success,
            code => ServiceResponse::Error(DataAccessError::from_code(code)),
        },
        ACTION_RESPONSE => match decoder.read_u8()? {
            0 => {
                let return_parameters = match decoder.read_u8()? {
                    0 => None,
                    1 => Some(decoder.read_value()?),
                    other => {
                        return Err(CosemError::Decode(format!(
                            "invalid return presence byte {other:#04x}"
                        )));
                    }
                };
                ServiceResponse::ActionData(return_parameters)
            }
            code => {
                let _ = decoder.read_u8();
                ServiceResponse::Error(DataAccessError::from_code(code))
            }
        },
        other => {
            return Err(CosemError::Decode(format!(
                "unknown response tag {other:#04x}"
            )));
        }
    };
    Ok((response, invoke_id))
}

fn write_address(encoder: &mut Encoder, address: &AttributeAddress) -> CosemResult<()> {
    let ObjectName::Logical(obis) = address.name else {
        return Err(CosemError::Encode(
            "the wire form carries logical-name addresses only".into(),
        ));
    };
    encoder.write_u16(address.class_id);
    encoder.write_octets(obis.as_bytes());
    encoder.write_u8(address.index);
    Ok(())
}

fn read_address(decoder: &mut Decoder<'_>) -> CosemResult<AttributeAddress> {
    let class_id = decoder.read_u16()?;
    let obis = ObisCode::from_bytes(decoder.read_bytes(6)?)
        .map_err(|e| CosemError::Decode(e.to_string()))?;
    let index = decoder.read_u8()?;
    Ok(AttributeAddress::logical(class_id, obis, index))
}

fn write_access(encoder: &mut Encoder, access: &Option<SelectiveAccess>) -> CosemResult<()> {
    match access {
        Some(access) => {
            encoder.write_u8(1);
            encoder.write_u8(access.selector());
            encoder.write_value(&access.to_parameters())?;
        }
        None => encoder.write_u8(0),
    }
    Ok(())
}

fn read_access(decoder: &mut Decoder<'_>) -> CosemResult<Option<SelectiveAccess>> {
    match decoder.read_u8()? {
        0 => Ok(None),
        1 => {
            let selector = decoder.read_u8()?;
            let parameters = decoder.read_value()?;
            Ok(Some(SelectiveAccess::from_parameters(selector, &parameters)?))
        }
        other => Err(CosemError::Decode(format!(
            "invalid access presence byte {other:#04x}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosem_core::Value;

    fn energy_address() -> AttributeAddress {
        AttributeAddress::logical(3, ObisCode::new(1, 0, 1, 8, 0, 255), 2)
    }

    #[test]
    fn get_request_wire_shape() {
        let request = ServiceRequest::Get {
            address: energy_address(),
            access: None,
        };
        let bytes = encode_request(&request, 0x41).unwrap();
        assert_eq!(
            bytes,
            [0xC0, 0x01, 0x41, 0x00, 0x03, 1, 0, 1, 8, 0, 255, 0x02, 0x00]
        );
        let (decoded, invoke_id) = decode_request(&bytes).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(invoke_id, 0x41);
    }

    #[test]
    fn get_request_with_entry_selector() {
        let request = ServiceRequest::Get {
            address: AttributeAddress::logical(7, ObisCode::new(1, 0, 99, 1, 0, 255), 2),
            access: Some(SelectiveAccess::Entry {
                start: 0,
                count: 50,
            }),
        };
        let bytes = encode_request(&request, 1).unwrap();
        // presence byte, selector 2, then the parameter structure
        assert_eq!(bytes[12], 1);
        assert_eq!(bytes[13], 2);
        let (decoded, _) = decode_request(&bytes).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn set_and_action_round_trip() {
        let set = ServiceRequest::Set {
            address: energy_address(),
            access: None,
            value: Value::Unsigned32(1234),
        };
        let (decoded, _) = decode_request(&encode_request(&set, 2).unwrap()).unwrap();
        assert_eq!(decoded, set);

        let action = ServiceRequest::Action {
            address: AttributeAddress::logical(8, ObisCode::new(0, 0, 1, 0, 0, 255), 4),
            parameters: Some(Value::Integer16(-300)),
        };
        let (decoded, _) = decode_request(&encode_request(&action, 3).unwrap()).unwrap();
        assert_eq!(decoded, action);

        let silent = ServiceRequest::Action {
            address: AttributeAddress::logical(7, ObisCode::new(1, 0, 99, 1, 0, 255), 1),
            parameters: None,
        };
        let (decoded, _) = decode_request(&encode_request(&silent, 4).unwrap()).unwrap();
        assert_eq!(decoded, silent);
    }

    #[test]
    fn response_round_trips() {
        for (response, kind) in [
            (
                ServiceResponse::Data(Value::Unsigned32(7)),
                ServiceKind::Get,
            ),
            (
                ServiceResponse::Error(DataAccessError::ReadWriteDenied),
                ServiceKind::Get,
            ),
            (ServiceResponse::Success, ServiceKind::Set),
            (
                ServiceResponse::Error(DataAccessError::ObjectUnavailable),
                ServiceKind::Set,
            ),
            (ServiceResponse::ActionData(None), ServiceKind::Action),
            (
                ServiceResponse::ActionData(Some(Value::Boolean(true))),
                ServiceKind::Action,
            ),
            (
                ServiceResponse::Error(DataAccessError::ObjectUndefined),
                ServiceKind::Action,
            ),
        ] {
            let bytes = encode_response(&response, kind, 0x81).unwrap();
            let (decoded, invoke_id) = decode_response(&bytes).unwrap();
            assert_eq!(decoded, response);
            assert_eq!(invoke_id, 0x81);
        }
    }

    #[test]
    fn malformed_requests_fail_to_decode() {
        assert!(matches!(
            decode_request(&[0xC0, 0x02, 0x01]),
            Err(CosemError::Decode(_))
        ));
        assert!(matches!(
            decode_request(&[0xAA, 0x01, 0x01]),
            Err(CosemError::Decode(_))
        ));
        // Truncated descriptor.
        assert!(matches!(
            decode_request(&[0xC0, 0x01, 0x01, 0x00, 0x03, 1, 0]),
            Err(CosemError::Decode(_))
        ));
    }

    #[test]
    fn short_name_addresses_stay_off_the_wire() {
        let request = ServiceRequest::Get {
            address: AttributeAddress {
                class_id: 3,
                name: ObjectName::Short(0xFA00),
                index: 2,
            },
            access: None,
        };
        assert!(matches!(
            encode_request(&request, 1),
            Err(CosemError::Encode(_))
        ));
    }
}
