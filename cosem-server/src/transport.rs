//! The transport boundary: decrypted APDU payloads in, response APDUs
//! out. Framing, ciphering and association setup happen on the other
//! side of this trait.

use crate::access::AuthenticationLevel;
use crate::apdu;
use crate::dispatcher::CosemServer;
use crate::request::{DataAccessError, ServiceResponse};
use async_trait::async_trait;
use cosem_core::{CosemError, CosemResult};
use tokio::sync::mpsc;

/// Exception-response tag emitted when a request APDU cannot be decoded.
const EXCEPTION_RESPONSE: u8 = 0xD8;

#[async_trait]
pub trait ApduLink: Send {
    async fn send(&mut self, apdu: &[u8]) -> CosemResult<()>;

    /// The next inbound APDU, or `None` when the peer is gone.
    async fn recv(&mut self) -> CosemResult<Option<Vec<u8>>>;
}

/// In-process link over a pair of channels; the test and demo transport.
pub struct ChannelLink {
    tx: mpsc::Sender<Vec<u8>>,
    rx: mpsc::Receiver<Vec<u8>>,
}

impl ChannelLink {
    /// Two connected endpoints.
    pub fn pair(capacity: usize) -> (ChannelLink, ChannelLink) {
        let (a_tx, a_rx) = mpsc::channel(capacity);
        let (b_tx, b_rx) = mpsc::channel(capacity);
        (
            ChannelLink { tx: a_tx, rx: b_rx },
            ChannelLink { tx: b_tx, rx: a_rx },
        )
    }
}

#[async_trait]
impl ApduLink for ChannelLink {
    async fn send(&mut self, apdu: &[u8]) -> CosemResult<()> {
        self.tx
            .send(apdu.to_vec())
            .await
            .map_err(|_| CosemError::Protocol("peer closed the link".into()))
    }

    async fn recv(&mut self) -> CosemResult<Option<Vec<u8>>> {
        Ok(self.rx.recv().await)
    }
}

/// One-request-in, one-response-out service loop. Runs until the link
/// closes. An undecodable request produces an exception response instead
/// of tearing the loop down.
pub async fn serve(
    link: &mut dyn ApduLink,
    server: &CosemServer,
    level: AuthenticationLevel,
) -> CosemResult<()> {
    while let Some(bytes) = link.recv().await? {
        let response = match apdu::decode_request(&bytes) {
            Ok((request, invoke_id)) => {
                let outcome = server.dispatch(&request, level).await;
                apdu::encode_response(&outcome, request.kind(), invoke_id)?
            }
            Err(error) => {
                log::warn!("undecodable request APDU: {error}");
                vec![
                    EXCEPTION_RESPONSE,
                    0x01,
                    DataAccessError::OtherReason.code(),
                ]
            }
        };
        link.send(&response).await?;
    }
    log::debug!("link closed, service loop ends");
    Ok(())
}

/// Convenience for request/response clients over a link: send one request
/// APDU and wait for its response.
pub async fn roundtrip(
    link: &mut dyn ApduLink,
    request: &crate::request::ServiceRequest,
    invoke_id: u8,
) -> CosemResult<ServiceResponse> {
    link.send(&apdu::encode_request(request, invoke_id)?).await?;
    let Some(bytes) = link.recv().await? else {
        return Err(CosemError::Protocol("link closed mid-request".into()));
    };
    if bytes.first() == Some(&EXCEPTION_RESPONSE) {
        return Err(CosemError::Protocol("peer rejected the request".into()));
    }
    let (response, echoed) = apdu::decode_response(&bytes)?;
    if echoed != invoke_id {
        return Err(CosemError::Protocol(format!(
            "invoke id mismatch: sent {invoke_id}, got {echoed}"
        )));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{AttributeAddress, ServiceRequest};
    use cosem_core::{ObisCode, Value};
    use cosem_object::{units, Register, ScalerUnit};
    use mockall::mock;
    use std::sync::Arc;

    mock! {
        Link {}

        #[async_trait]
        impl ApduLink for Link {
            async fn send(&mut self, apdu: &[u8]) -> CosemResult<()>;
            async fn recv(&mut self) -> CosemResult<Option<Vec<u8>>>;
        }
    }

    fn energy_name() -> ObisCode {
        ObisCode::new(1, 0, 1, 8, 0, 255)
    }

    async fn server() -> CosemServer {
        let server = CosemServer::new();
        server
            .register_object(Arc::new(Register::new(
                energy_name(),
                Value::Unsigned32(777),
                ScalerUnit::new(0, units::WATT_HOUR),
            )))
            .await
            .unwrap();
        server
    }

    #[test]
    fn channel_link_delivers_in_order() {
        tokio_test::block_on(async {
            let (mut a, mut b) = ChannelLink::pair(2);
            a.send(&[1]).await.unwrap();
            a.send(&[2]).await.unwrap();
            assert_eq!(b.recv().await.unwrap(), Some(vec![1]));
            assert_eq!(b.recv().await.unwrap(), Some(vec![2]));
            drop(a);
            assert_eq!(b.recv().await.unwrap(), None);
        });
    }

    #[tokio::test]
    async fn end_to_end_over_a_channel_link() {
        let (mut client, mut meter) = ChannelLink::pair(4);
        let server = server().await;
        let service = tokio::spawn(async move {
            serve(&mut meter, &server, AuthenticationLevel::None).await
        });

        let request = ServiceRequest::Get {
            address: AttributeAddress::logical(3, energy_name(), 2),
            access: None,
        };
        let response = roundtrip(&mut client, &request, 0x10).await.unwrap();
        assert_eq!(response, ServiceResponse::Data(Value::Unsigned32(777)));

        // A write at no authentication comes back denied, not empty.
        let request = ServiceRequest::Set {
            address: AttributeAddress::logical(3, energy_name(), 2),
            access: None,
            value: Value::Unsigned32(0),
        };
        let response = roundtrip(&mut client, &request, 0x11).await.unwrap();
        assert_eq!(
            response,
            ServiceResponse::Error(DataAccessError::ReadWriteDenied)
        );

        drop(client);
        service.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn garbage_gets_an_exception_response() {
        let (mut client, mut meter) = ChannelLink::pair(4);
        let server = server().await;
        let service = tokio::spawn(async move {
            serve(&mut meter, &server, AuthenticationLevel::None).await
        });

        client.send(&[0xDE, 0xAD, 0xBE, 0xEF]).await.unwrap();
        let reply = client.recv().await.unwrap().unwrap();
        assert_eq!(reply[0], EXCEPTION_RESPONSE);

        drop(client);
        service.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn serve_answers_each_request_on_a_mock_link() {
        let request = ServiceRequest::Get {
            address: AttributeAddress::logical(3, energy_name(), 2),
            access: None,
        };
        let encoded = apdu::encode_request(&request, 7).unwrap();

        let mut link = MockLink::new();
        let mut delivered = false;
        link.expect_recv().times(2).returning(move || {
            if delivered {
                Ok(None)
            } else {
                delivered = true;
                Ok(Some(encoded.clone()))
            }
        });
        link.expect_send()
            .times(1)
            .withf(|apdu: &[u8]| apdu[0] == 0xC4 && apdu[2] == 7)
            .returning(|_| Ok(()));

        let server = server().await;
        serve(&mut link, &server, AuthenticationLevel::None)
            .await
            .unwrap();
    }
}
